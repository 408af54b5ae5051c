use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use logging::LoggerOptions;
use portcullis_client::ClientSettings;
use portcullis_config::defaults::{
    DEFAULT_BASE_URL, DEFAULT_LOGIN_PATH, DEFAULT_LOG_LEVEL, DEFAULT_ORGANIZATION_ID,
    DEFAULT_TIMEOUT_SECS,
};
use portcullis_config::PortcullisConfig;
use portcullis_core::{permissions, PermissionString};
use portcullis_routing::{GuardOptions, LoadFailurePolicy};

/// Effective CLI settings: config file values, overridden by environment
/// variables where set.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub organization_id: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub login_path: String,
    pub on_load_failure: LoadFailurePolicy,
    pub testing_override: Vec<PermissionString>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub log_json: bool,
}

impl Settings {
    pub fn from_config(config: &PortcullisConfig) -> Result<Self> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// `lookup` resolves `PORTCULLIS_*` overrides (useful for testing).
    pub fn from_config_with(
        config: &PortcullisConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let management = config.management();
        let guards = config.guards();
        let logging = config.logging();

        let on_load_failure = match guards.on_load_failure.as_deref().unwrap_or("abort") {
            "abort" => LoadFailurePolicy::Abort,
            "deny" => LoadFailurePolicy::Deny,
            other => bail!("unknown load failure policy '{other}'"),
        };

        Ok(Self {
            base_url: lookup("PORTCULLIS_BASE_URL")
                .or(management.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            organization_id: lookup("PORTCULLIS_ORGANIZATION")
                .or(management.organization_id)
                .unwrap_or_else(|| DEFAULT_ORGANIZATION_ID.to_string()),
            token: lookup("PORTCULLIS_TOKEN").or(management.token),
            timeout: Duration::from_secs(management.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            login_path: guards
                .login_path
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            on_load_failure,
            testing_override: permissions(config.testing_override()),
            log_level: lookup("RUST_LOG")
                .or(logging.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_dir: logging.dir.map(PathBuf::from),
            log_json: logging.json.unwrap_or(false),
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            organization_id: self.organization_id.clone(),
            token: self.token.clone(),
            timeout: self.timeout,
        }
    }

    pub fn guard_options(&self) -> GuardOptions {
        GuardOptions {
            login_path: self.login_path.clone(),
            on_load_failure: self.on_load_failure,
        }
    }

    pub fn logger_options(&self) -> LoggerOptions {
        LoggerOptions {
            level: self.log_level.clone(),
            dir: self.log_dir.clone(),
            json: self.log_json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_config::parse_config;

    #[test]
    fn env_overrides_config_values() {
        let config = parse_config(
            "management:\n  baseUrl: http://file/management\n  organizationId: ACME\n",
        )
        .unwrap();
        let settings = Settings::from_config_with(&config, |name| match name {
            "PORTCULLIS_BASE_URL" => Some("http://env/management".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(settings.base_url, "http://env/management");
        assert_eq!(settings.organization_id, "ACME");
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.login_path, "/_login");
        assert_eq!(settings.on_load_failure, LoadFailurePolicy::Abort);
    }

    #[test]
    fn rejects_unknown_policy() {
        let config = parse_config("guards:\n  onLoadFailure: retry\n").unwrap();
        assert!(Settings::from_config_with(&config, |_| None).is_err());
    }
}
