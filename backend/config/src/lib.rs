//! `portcullis-config`: runtime configuration.
//!
//! Provides:
//! - Typed config schema (management API, guards, permissions, logging)
//! - YAML loading
//! - `${ENV_VAR}` substitution
//! - Default value application
//! - Validation with errors and warnings
//! - Redaction for safe display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config};
pub use redact::redact;
pub use schema::PortcullisConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load a config file, substitute env vars, apply defaults and validate.
///
/// Validation errors abort; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<PortcullisConfig> {
    let raw = load_config(path).await?;
    prepare(raw, &std::env::vars().collect())
}

/// The processing half of [`load_and_prepare`], with an explicit env map.
pub fn prepare(raw: PortcullisConfig, env: &HashMap<String, String>) -> Result<PortcullisConfig> {
    let value: Value =
        serde_json::to_value(&raw).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars_with(&value, env)?;
    let config: PortcullisConfig = serde_json::from_value(value)
        .context("Failed to deserialize config after env substitution")?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if let Some(first) = report.errors.first() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        bail!("{} config error(s), first: {}", report.errors.len(), first);
    }

    Ok(config)
}
