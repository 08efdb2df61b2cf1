//! Configuration module for SearXNG-Gateway
//!
//! Handles loading and validating settings from YAML files and environment variables.
//! Core components receive a `Settings` value; nothing below the binary reads
//! files or the environment.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "GATEWAY_SETTINGS_PATH";

/// Default settings file locations, in lookup order
pub fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/searxng-gateway/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("searxng-gateway/settings.yml"));
    }
    paths
}

/// Load settings from the first file found, apply environment overrides and validate.
///
/// Returns the settings and the file they came from (`None` = defaults).
pub fn load() -> Result<(Settings, Option<PathBuf>)> {
    let explicit = std::env::var(SETTINGS_PATH_VAR).ok().map(PathBuf::from);

    let found = explicit
        .into_iter()
        .chain(default_paths())
        .find(|path| path.exists());

    let mut settings = match &found {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    settings.merge_env();
    settings.validate()?;
    Ok((settings, found))
}
