//! Configuration loading and saving utilities.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::schema::Config;

/// Get the default configuration file path (`~/.pesas/config.json`).
pub fn get_config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".pesas").join("config.json")
}

/// Load configuration from a file, or return a default [`Config`] if the file
/// does not exist or cannot be parsed. Environment overrides are applied on
/// top of whatever was loaded.
///
/// If `config_path` is `None`, the default path (`~/.pesas/config.json`) is
/// used.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path(),
    };

    let mut config = Config::default();
    if path.exists() {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(cfg) => config = cfg,
                Err(e) => {
                    warn!(
                        "Failed to parse config from {}: {}. Using default configuration.",
                        path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read config from {}: {}. Using default configuration.",
                    path.display(),
                    e
                );
            }
        }
    }

    apply_env_overrides(&mut config);
    config
}

/// Environment variables override the file so the bot can run in hosted
/// environments with no config file at all.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(key) = std::env::var("AIRTABLE_API_KEY") {
        config.airtable.api_key = key;
    }
    if let Ok(base) = std::env::var("AIRTABLE_BASE_PESAS") {
        config.airtable.base_id = base;
    }
    if let Ok(user) = std::env::var("PESAS_USER_RECORD_ID") {
        config.airtable.user_record_id = user;
    }
    if let Ok(secret) = std::env::var("SLACK_SIGNING_SECRET") {
        config.slack.signing_secret = secret;
    }
}

/// Save configuration to a JSON file.
///
/// If `config_path` is `None`, the default path (`~/.pesas/config.json`) is
/// used. Parent directories are created if they don't exist.
pub fn save_config(config: &Config, config_path: Option<&Path>) {
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => get_config_path(),
    };

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match serde_json::to_string_pretty(config) {
        Ok(json) => {
            if let Err(e) = fs::write(&path, json) {
                warn!("Failed to write config to {}: {}", path.display(), e);
            }
        }
        Err(e) => {
            warn!("Failed to serialize config: {}", e);
        }
    }
}
