//! Slack delayed-reply delivery via the command's `response_url`.

use async_trait::async_trait;

use crate::dispatch::{DelayedReplier, Reply, SlackCommand};
use crate::errors::DispatchError;

/// Delivers delayed replies by posting to the webhook URL Slack attaches to
/// each slash command. Valid for a short window after the command, which the
/// fixed dispatch delay stays well inside.
#[derive(Clone, Default)]
pub struct SlackReplier {
    client: reqwest::Client,
}

impl SlackReplier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl DelayedReplier for SlackReplier {
    async fn deliver(&self, command: &SlackCommand, reply: Reply) -> Result<(), DispatchError> {
        let response = self
            .client
            .post(&command.response_url)
            .json(&reply.to_payload())
            .send()
            .await
            .map_err(|e| DispatchError::Delivery(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DispatchError::Delivery(format!(
                "status {}",
                response.status()
            )));
        }
        Ok(())
    }
}
