//! Config file location and loading.

use crate::schema::PortcullisConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the config directory.
/// Priority: `PORTCULLIS_CONFIG_DIR` env > `~/.portcullis/` > `./.portcullis`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PORTCULLIS_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .map(|home| home.join(".portcullis"))
        .unwrap_or_else(|| PathBuf::from(".portcullis"))
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read and parse the config file.
///
/// Returns `Ok(Default::default())` if the file doesn't exist.
pub async fn load_config(path: &Path) -> Result<PortcullisConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(PortcullisConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Parse YAML text; an empty document yields the default config.
pub fn parse_config(raw: &str) -> Result<PortcullisConfig> {
    if raw.trim().is_empty() {
        return Ok(PortcullisConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}
