//! Configuration schema for pesas.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so that the JSON
//! config file can use camelCase keys while Rust code uses snake_case fields.

use serde::{Deserialize, Serialize};

/// Airtable connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirtableConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_id: String,
    /// Record id of the user new meals are linked to. Optional; when empty
    /// the link field is omitted.
    #[serde(default)]
    pub user_record_id: String,
}

/// Slack settings. The signing secret is stored for completeness but request
/// verification is out of scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    #[serde(default)]
    pub signing_secret: String,
}

/// Deferred-dispatch tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSettings {
    /// Seconds to wait before delivering the delayed reply.
    #[serde(default = "default_delay_seconds")]
    pub delay_seconds: u64,
}

fn default_delay_seconds() -> u64 {
    2
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            delay_seconds: default_delay_seconds(),
        }
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub airtable: AirtableConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub dispatch: DispatchSettings,
    #[serde(default)]
    pub server: ServerConfig,
}
