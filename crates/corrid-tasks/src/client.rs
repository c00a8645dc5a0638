//! Dispatch side of the task runtime.

use crate::transport::TaskTransport;
use corrid_core::{Result, TaskEnvelope, TaskId};
use corrid_interceptor::InterceptorRegistry;
use corrid_observability::spans;
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Clone)]
pub struct TaskClient {
    transport: Arc<dyn TaskTransport>,
    interceptors: Arc<InterceptorRegistry>,
}

impl TaskClient {
    pub fn new(transport: Arc<dyn TaskTransport>, interceptors: Arc<InterceptorRegistry>) -> Self {
        Self {
            transport,
            interceptors,
        }
    }

    pub fn interceptors(&self) -> Arc<InterceptorRegistry> {
        self.interceptors.clone()
    }

    /// Build an envelope for `name` and send it.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<TaskId> {
        self.send(TaskEnvelope::new(name, args)).await
    }

    /// Run the dispatch interceptors on `task`, then publish it.
    pub async fn send(&self, mut task: TaskEnvelope) -> Result<TaskId> {
        let span = spans::task_dispatch(&task.name, task.id.as_str());
        self.interceptors.before_dispatch(&mut task);
        let task_id = task.id.clone();
        self.transport.publish(task).instrument(span).await?;
        Ok(task_id)
    }
}
