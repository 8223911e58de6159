//! Deferred dispatch: the two-phase fast-ack / background-work protocol.
//!
//! The chat platform gives the webhook only a few seconds to answer, but the
//! real work (store lookups, writes, aggregation) can take longer. A fresh
//! envelope is therefore acknowledged immediately while a background-marked
//! copy of it is re-submitted through the [`SelfInvoker`] boundary; the
//! background execution does the work and delivers the real answer through
//! the [`DelayedReplier`] boundary.

pub mod controller;
pub mod envelope;
pub mod queue;

pub use controller::{DispatchConfig, DispatchController, DispatchOutcome};
pub use envelope::{DispatchEnvelope, Reply, SlackCommand};
pub use queue::JobQueue;

use async_trait::async_trait;

use crate::errors::DispatchError;

/// Fire-and-forget re-invocation boundary: submit a background-marked copy of
/// the current envelope for independent execution. Nothing beyond acceptance
/// is awaited.
#[async_trait]
pub trait SelfInvoker: Send + Sync {
    async fn invoke(&self, envelope: DispatchEnvelope) -> Result<(), DispatchError>;
}

/// Out-of-band reply boundary: deliver text to the original chat channel
/// after the synchronous response window has already closed.
#[async_trait]
pub trait DelayedReplier: Send + Sync {
    async fn deliver(&self, command: &SlackCommand, reply: Reply) -> Result<(), DispatchError>;
}
