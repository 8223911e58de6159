//! Webhook server: receives Slack slash commands, runs the fresh dispatch
//! phase inline and drains the background job queue on a worker task.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::dispatch::{
    DispatchConfig, DispatchController, DispatchEnvelope, DispatchOutcome, JobQueue, SlackCommand,
};
use crate::slack::SlackReplier;
use crate::store::AirtableStore;

type Controller = DispatchController<JobQueue, SlackReplier, AirtableStore>;

/// The form body of a Slack slash-command webhook. Unknown fields are
/// ignored; Slack sends more than we use.
#[derive(Debug, Deserialize)]
struct SlashPayload {
    #[serde(default)]
    text: String,
    #[serde(default)]
    response_url: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    command: String,
}

/// Start the webhook server on `port` and block until it exits.
pub async fn serve(config: Config, port: u16) -> anyhow::Result<()> {
    let queue = JobQueue::new();
    let controller = Arc::new(DispatchController::new(
        queue.clone(),
        SlackReplier::new(),
        AirtableStore::new(&config.airtable),
        DispatchConfig {
            delay_seconds: config.dispatch.delay_seconds,
            user_record_id: config.airtable.user_record_id.clone(),
        },
    ));

    // Background drain task: each queued envelope runs as an independent
    // execution of the same dispatch entry point.
    let worker = Arc::clone(&controller);
    tokio::spawn(async move {
        while let Some(envelope) = queue.next().await {
            let outcome = worker.dispatch(envelope).await;
            debug!(?outcome, "background job finished");
        }
    });

    let app = Router::new()
        .route("/slack/command", post(slash_command))
        .route("/healthz", get(healthz))
        .with_state(controller);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("pesas listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn slash_command(
    State(controller): State<Arc<Controller>>,
    Form(payload): Form<SlashPayload>,
) -> Json<Value> {
    let command = SlackCommand {
        text: payload.text,
        response_url: payload.response_url,
        channel_id: payload.channel_id,
        user_id: payload.user_id,
        user_name: payload.user_name,
        command: payload.command,
    };
    match controller.dispatch(DispatchEnvelope::fresh(command)).await {
        DispatchOutcome::Ack(reply) => Json(reply.to_payload()),
        // Fresh envelopes never take the background path; keep the webhook
        // contract total anyway.
        DispatchOutcome::Suppressed => Json(Value::Null),
    }
}

async fn healthz() -> &'static str {
    "ok"
}
