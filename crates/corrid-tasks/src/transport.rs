//! Task transports.

use async_trait::async_trait;
use corrid_core::{CorrelationError, Result, TaskEnvelope};
use tokio::sync::mpsc;

#[async_trait]
pub trait TaskTransport: Send + Sync {
    async fn publish(&self, task: TaskEnvelope) -> Result<()>;
}

/// Channel-backed transport for tests and single-process deployments.
///
/// Every envelope is encoded to JSON and decoded again before it is queued,
/// so only what the envelope itself carries reaches the worker.
#[derive(Clone)]
pub struct InMemoryTransport {
    sender: mpsc::UnboundedSender<TaskEnvelope>,
}

impl InMemoryTransport {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TaskEnvelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl TaskTransport for InMemoryTransport {
    async fn publish(&self, task: TaskEnvelope) -> Result<()> {
        let wire = serde_json::to_vec(&task)?;
        let received: TaskEnvelope = serde_json::from_slice(&wire)?;
        self.sender
            .send(received)
            .map_err(|_| CorrelationError::Transport("worker queue is closed".to_string()))
    }
}
