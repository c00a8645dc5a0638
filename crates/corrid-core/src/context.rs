//! Snapshot and re-bind of the whole identifier store.
//!
//! `tokio::spawn` starts a task with empty task-locals. `CorrelationContext`
//! captures the caller's bindings so they can be carried into a spawned task,
//! and is also what the task-start interceptors fill in before a task body
//! runs on a worker.

use crate::correlation::{self, with_correlation_id};
use crate::ids::CorrelationId;
use crate::lineage::{self, TaskLineage, with_lineage};
use std::future::Future;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrelationContext {
    pub correlation_id: Option<CorrelationId>,
    pub lineage: Option<TaskLineage>,
}

impl CorrelationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the bindings visible to the caller.
    pub fn capture() -> Self {
        Self {
            correlation_id: correlation::current_correlation_id(),
            lineage: lineage::current_lineage(),
        }
    }

    pub fn with_correlation_id(mut self, id: CorrelationId) -> Self {
        self.correlation_id = Some(id);
        self
    }

    pub fn with_lineage(mut self, lineage: TaskLineage) -> Self {
        self.lineage = Some(lineage);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.correlation_id.is_none() && self.lineage.is_none()
    }

    /// Run `fut` with this context bound.
    ///
    /// A `None` slot binds nothing, leaving any enclosing binding visible.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        match (self.correlation_id, self.lineage) {
            (Some(id), Some(lineage)) => with_correlation_id(id, with_lineage(lineage, fut)).await,
            (Some(id), None) => with_correlation_id(id, fut).await,
            (None, Some(lineage)) => with_lineage(lineage, fut).await,
            (None, None) => fut.await,
        }
    }

    pub fn sync_scope<F, T>(self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        match (self.correlation_id, self.lineage) {
            (Some(id), Some(lineage)) => correlation::sync_with_correlation_id(id, || {
                lineage::sync_with_lineage(lineage, f)
            }),
            (Some(id), None) => correlation::sync_with_correlation_id(id, f),
            (None, Some(lineage)) => lineage::sync_with_lineage(lineage, f),
            (None, None) => f(),
        }
    }
}

/// Spawn `fut` on the tokio runtime, inheriting the caller's bindings.
pub fn spawn<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let context = CorrelationContext::capture();
    tokio::spawn(context.scope(fut))
}
