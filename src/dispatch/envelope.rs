//! Dispatch envelope and reply types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The slash-command payload as the chat platform sends it. Travels inside
/// the envelope so the background execution needs no shared state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackCommand {
    /// Raw command text after the slash command itself.
    #[serde(default)]
    pub text: String,
    /// Webhook URL for delayed replies to this command.
    #[serde(default)]
    pub response_url: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    /// The slash command itself (e.g. `/psas`).
    #[serde(default)]
    pub command: String,
}

/// An inbound event plus the background-job marker.
///
/// An envelope is processed by exactly one of the two phases: the marker is
/// the only thing the state machine keys on, and the two executions share no
/// other state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchEnvelope {
    pub command: SlackCommand,
    /// Set on the copy the system re-submits to itself.
    #[serde(default)]
    pub background: bool,
}

impl DispatchEnvelope {
    /// A user-originated envelope (no marker).
    pub fn fresh(command: SlackCommand) -> Self {
        Self {
            command,
            background: false,
        }
    }

    /// The background-marked copy submitted for phase two.
    pub fn into_background(mut self) -> Self {
        self.background = true;
        self
    }
}

/// A chat reply: text plus channel visibility.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub in_channel: bool,
}

impl Reply {
    /// Reply visible to the whole channel.
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            in_channel: true,
        }
    }

    /// Reply visible only to the command issuer.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            in_channel: false,
        }
    }

    /// The JSON body the chat platform expects.
    pub fn to_payload(&self) -> Value {
        json!({
            "response_type": if self.in_channel { "in_channel" } else { "ephemeral" },
            "text": self.text,
        })
    }
}
