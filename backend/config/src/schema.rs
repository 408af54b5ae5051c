//! Portcullis configuration schema.
//!
//! Typed for serde YAML/JSON deserialization with camelCase keys. Every
//! section is optional on disk; defaults fill the gaps after loading.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortcullisConfig {
    /// Management API connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management: Option<ManagementConfig>,

    /// Route guard behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guards: Option<GuardsConfig>,

    /// Static permission settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionsConfig>,

    /// Logging configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Management API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementConfig {
    /// Base URL, e.g. `http://localhost:8083/management`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Bearer token; usually `${PORTCULLIS_TOKEN}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardsConfig {
    /// Where denied navigations are redirected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_path: Option<String>,
    /// `abort` or `deny`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_load_failure: Option<String>,
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsConfig {
    /// Tokens always granted in addition to loaded ones. Test setups only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub testing_override: Vec<String>,
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling NDJSON logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl PortcullisConfig {
    pub fn management(&self) -> ManagementConfig {
        self.management.clone().unwrap_or_default()
    }

    pub fn guards(&self) -> GuardsConfig {
        self.guards.clone().unwrap_or_default()
    }

    pub fn testing_override(&self) -> &[String] {
        self.permissions
            .as_ref()
            .map(|p| p.testing_override.as_slice())
            .unwrap_or(&[])
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
management:
  baseUrl: http://localhost:8083/management
  organizationId: DEFAULT
  timeoutSecs: 10
guards:
  loginPath: /_login
  onLoadFailure: deny
permissions:
  testingOverride: [api-log-r]
"#;
        let config: PortcullisConfig = serde_yaml::from_str(yaml).unwrap();
        let management = config.management();
        assert_eq!(management.timeout_secs, Some(10));
        assert_eq!(config.guards().on_load_failure.as_deref(), Some("deny"));
        assert_eq!(config.testing_override(), ["api-log-r".to_string()]);
        assert!(config.logging.is_none());
    }
}
