//! # Settings Persistence
//!
//! Saves and loads the estimator settings block as pretty-printed JSON.
//! Missing fields take their defaults, so settings written by an older
//! version still load.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pitch_core::FundamentalConfig;

/// Parses settings from a JSON string.
///
/// Rule violations are logged, not rejected: the estimator falls back to a
/// single-frame curve on a configuration it cannot use.
pub fn config_from_json(json: &str) -> Result<FundamentalConfig> {
    let config: FundamentalConfig =
        serde_json::from_str(json).context("Failed to parse fundamental settings")?;
    for issue in config.validate() {
        log::warn!("[SETTINGS] {}", issue);
    }
    Ok(config)
}

/// Saves the settings to a JSON file.
///
/// # Arguments
/// * `config` - The settings to save
/// * `path` - File path where the settings should be saved
///
/// # Returns
/// * `Ok(())` - Settings saved successfully
/// * `Err(e)` - File I/O error or JSON serialization error
pub fn save_config(config: &FundamentalConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json_string =
        serde_json::to_string_pretty(config).context("Failed to serialize fundamental settings")?;
    fs::write(path, json_string)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;
    Ok(())
}

/// Loads the settings from a JSON file.
///
/// # Returns
/// * `Ok(config)` - Successfully loaded settings
/// * `Err(e)` - File I/O error or JSON deserialization error
pub fn load_config(path: impl AsRef<Path>) -> Result<FundamentalConfig> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    config_from_json(&data)
}
