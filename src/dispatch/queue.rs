//! In-process job queue backing the re-invocation boundary.
//!
//! Uses `tokio::sync::mpsc::unbounded_channel`: the submit side is the
//! fire-and-forget "invoke an async copy of me" primitive, and a drain task
//! plays the independent background execution. The queue can be cloned
//! cheaply because the receiver sits behind `Arc<Mutex<_>>`.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;

use crate::dispatch::envelope::DispatchEnvelope;
use crate::dispatch::SelfInvoker;
use crate::errors::DispatchError;

/// Unbounded queue of background-marked envelopes.
#[derive(Clone)]
pub struct JobQueue {
    tx: UnboundedSender<DispatchEnvelope>,
    rx: Arc<Mutex<UnboundedReceiver<DispatchEnvelope>>>,
}

impl JobQueue {
    /// Create a new `JobQueue`.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Submit an envelope for background execution. Never blocks.
    pub fn submit(&self, envelope: DispatchEnvelope) -> Result<(), DispatchError> {
        self.tx
            .send(envelope)
            .map_err(|_| DispatchError::QueueClosed)
    }

    /// Take the next envelope (blocks until one is available).
    ///
    /// Returns `None` once all senders have been dropped.
    pub async fn next(&self) -> Option<DispatchEnvelope> {
        let mut rx = self.rx.lock().await;
        rx.recv().await
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SelfInvoker for JobQueue {
    async fn invoke(&self, envelope: DispatchEnvelope) -> Result<(), DispatchError> {
        self.submit(envelope)
    }
}
