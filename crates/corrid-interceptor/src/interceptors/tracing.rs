//! Tracing interceptor for task boundaries
//!
//! Emits structured events when a task is dispatched, started and finished.
//! Start and completion events are emitted inside the task's bindings, so
//! correlation-aware formatters tag them with the task's ids.

use crate::interceptor::{DispatchInterceptor, TaskStartInterceptor};
use corrid_core::{CorrelationContext, Result, TaskEnvelope};
use serde_json::Value;
use tracing::{debug, error, info};

pub struct TracingTaskInterceptor;

impl TracingTaskInterceptor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingTaskInterceptor {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchInterceptor for TracingTaskInterceptor {
    fn before_dispatch(&self, task: &mut TaskEnvelope) -> Result<()> {
        debug!(
            task = %task.name,
            task_id = %task.id,
            headers = ?task.headers,
            "Task dispatched"
        );
        Ok(())
    }
}

impl TaskStartInterceptor for TracingTaskInterceptor {
    fn on_task_start(&self, _task: &TaskEnvelope, _context: &mut CorrelationContext) -> Result<()> {
        Ok(())
    }

    fn on_task_run(&self, task: &TaskEnvelope) {
        debug!(task = %task.name, task_id = %task.id, "Task starting");
    }

    fn on_task_complete(&self, task: &TaskEnvelope, result: &Result<Value>) {
        match result {
            Ok(_) => info!(task = %task.name, task_id = %task.id, success = true, "Task completed"),
            Err(e) => error!(
                task = %task.name,
                task_id = %task.id,
                error = %e,
                success = false,
                "Task failed"
            ),
        }
    }
}
