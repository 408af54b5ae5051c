//! Config defaults: applies default values to parsed config.

use crate::schema::{GuardsConfig, LoggingConfig, ManagementConfig, PortcullisConfig};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8083/management";

pub const DEFAULT_ORGANIZATION_ID: &str = "DEFAULT";

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_LOGIN_PATH: &str = "/_login";

pub const DEFAULT_ON_LOAD_FAILURE: &str = "abort";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PortcullisConfig) -> PortcullisConfig {
    let config = apply_management_defaults(config);
    let config = apply_guard_defaults(config);
    apply_logging_defaults(config)
}

fn apply_management_defaults(mut config: PortcullisConfig) -> PortcullisConfig {
    let management = config.management.get_or_insert_with(ManagementConfig::default);
    if management.base_url.is_none() {
        management.base_url = Some(DEFAULT_BASE_URL.to_string());
    }
    if management.organization_id.is_none() {
        management.organization_id = Some(DEFAULT_ORGANIZATION_ID.to_string());
    }
    if management.timeout_secs.is_none() {
        management.timeout_secs = Some(DEFAULT_TIMEOUT_SECS);
    }
    config
}

fn apply_guard_defaults(mut config: PortcullisConfig) -> PortcullisConfig {
    let guards = config.guards.get_or_insert_with(GuardsConfig::default);
    if guards.login_path.is_none() {
        guards.login_path = Some(DEFAULT_LOGIN_PATH.to_string());
    }
    if guards.on_load_failure.is_none() {
        guards.on_load_failure = Some(DEFAULT_ON_LOAD_FAILURE.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: PortcullisConfig) -> PortcullisConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.json.is_none() {
        logging.json = Some(false);
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let config = apply_all_defaults(PortcullisConfig::default());
        let management = config.management();
        assert_eq!(management.base_url.as_deref(), Some(DEFAULT_BASE_URL));
        assert_eq!(management.organization_id.as_deref(), Some("DEFAULT"));
        assert_eq!(management.timeout_secs, Some(30));
        assert_eq!(config.guards().login_path.as_deref(), Some("/_login"));
        assert_eq!(config.logging().level.as_deref(), Some("info"));
    }

    #[test]
    fn keeps_explicit_values() {
        let mut config = PortcullisConfig::default();
        config.guards = Some(GuardsConfig {
            login_path: Some("/denied".to_string()),
            on_load_failure: Some("deny".to_string()),
        });
        let config = apply_all_defaults(config);
        assert_eq!(config.guards().login_path.as_deref(), Some("/denied"));
        assert_eq!(config.guards().on_load_failure.as_deref(), Some("deny"));
    }
}
