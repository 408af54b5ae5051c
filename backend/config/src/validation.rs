//! Config validation: field-level checks with user-friendly messages.

use crate::schema::PortcullisConfig;
use portcullis_core::PermissionString;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// All errors and warnings found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &PortcullisConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_management(config, &mut report);
    validate_guards(config, &mut report);
    validate_permissions(config, &mut report);
    report
}

fn validate_management(config: &PortcullisConfig, report: &mut ValidationReport) {
    let Some(management) = &config.management else { return };

    match management.base_url.as_deref().map(str::trim) {
        Some("") => report.error("management.baseUrl", "Base URL cannot be empty"),
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
            report.error("management.baseUrl", format!("Unsupported scheme in '{url}'"))
        }
        _ => {}
    }

    if let Some(org) = &management.organization_id {
        if org.trim().is_empty() {
            report.error("management.organizationId", "Organization id cannot be empty");
        }
    }

    if management.timeout_secs == Some(0) {
        report.error("management.timeoutSecs", "Timeout must be greater than 0");
    }

    if management.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
        report.warn("management.token", "No token configured; requests are unauthenticated");
    }
}

fn validate_guards(config: &PortcullisConfig, report: &mut ValidationReport) {
    let Some(guards) = &config.guards else { return };

    if let Some(path) = &guards.login_path {
        if !path.starts_with('/') {
            report.error("guards.loginPath", "Login path must start with '/'");
        }
    }

    if let Some(policy) = &guards.on_load_failure {
        if !matches!(policy.as_str(), "abort" | "deny") {
            report.error(
                "guards.onLoadFailure",
                format!("Unknown policy '{policy}' (expected 'abort' or 'deny')"),
            );
        }
    }
}

fn validate_permissions(config: &PortcullisConfig, report: &mut ValidationReport) {
    let overrides = config.testing_override();
    if overrides.is_empty() {
        return;
    }
    report.warn(
        "permissions.testingOverride",
        format!("{} permissions are granted unconditionally", overrides.len()),
    );
    for (i, token) in overrides.iter().enumerate() {
        if let Err(e) = PermissionString::parse(token) {
            report.error(format!("permissions.testingOverride[{i}]"), e.to_string());
        }
    }
}
