//! Domain error types for pesas.
//!
//! Typed errors at module boundaries; the dispatch controller flattens all of
//! them into user-readable reply text so no raw fault ever crosses the chat
//! boundary.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

/// Errors from remote record-store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Errors from the deferred-dispatch boundaries (background re-invocation
/// and delayed-reply delivery).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Background job queue is closed")]
    QueueClosed,

    #[error("Delayed reply delivery failed: {0}")]
    Delivery(String),
}
