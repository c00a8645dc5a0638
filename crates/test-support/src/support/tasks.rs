//! Task handlers that record what they observe, and a worker harness.

use corrid_core::correlation::current_correlation_id;
use corrid_core::lineage::{current_task_id, parent_task_id};
use corrid_core::{CorrelationConfig, CorrelationError, CorrelationId, TaskExecutionId};
use corrid_interceptor::InterceptorRegistry;
use corrid_tasks::{InMemoryTransport, TaskClient, Worker, handler_fn};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// Identifiers visible inside one task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub task: String,
    pub correlation_id: Option<CorrelationId>,
    pub current_id: Option<TaskExecutionId>,
    pub parent_id: Option<TaskExecutionId>,
}

impl Observation {
    pub fn capture(task: &str) -> Self {
        Self {
            task: task.to_string(),
            correlation_id: current_correlation_id(),
            current_id: current_task_id(),
            parent_id: parent_task_id(),
        }
    }
}

/// Client plus a running worker whose handlers report observations.
pub struct TaskHarness {
    pub client: TaskClient,
    observations: mpsc::UnboundedReceiver<Observation>,
    stop: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl TaskHarness {
    /// Register `chain[i]` so that it records an observation, logs, then
    /// dispatches `chain[i + 1]` (the last one dispatches nothing).
    pub fn chain(config: &CorrelationConfig, chain: &[&'static str]) -> Self {
        let registry = Arc::new(InterceptorRegistry::with_correlation(config));
        let (transport, receiver) = InMemoryTransport::channel();
        let client = TaskClient::new(Arc::new(transport), registry);
        let (observed, observations) = mpsc::unbounded_channel();

        let mut worker = Worker::new(client.clone());
        for (index, name) in chain.iter().enumerate() {
            let next = chain.get(index + 1).copied();
            let observed = observed.clone();
            worker.register_handler(
                *name,
                handler_fn(move |ctx, _args| {
                    let observed = observed.clone();
                    async move {
                        let _ = observed.send(Observation::capture(&ctx.name));
                        tracing::info!(task = %ctx.name, "running task");
                        if let Some(next) = next {
                            ctx.client.dispatch(next, json!({})).await?;
                        }
                        Ok::<_, CorrelationError>(json!({"task": ctx.name}))
                    }
                }),
            );
        }

        let (stop, stopped) = oneshot::channel::<()>();
        let worker = tokio::spawn(Arc::new(worker).run_until(receiver, async move {
            let _ = stopped.await;
        }));
        Self {
            client,
            observations,
            stop: Some(stop),
            worker: Some(worker),
        }
    }

    pub async fn next_observation(&mut self) -> Observation {
        tokio::time::timeout(Duration::from_secs(5), self.observations.recv())
            .await
            .expect("timed out waiting for a task to run")
            .expect("observation channel closed")
    }

    /// Stop the worker and wait for the tasks it already accepted.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            tokio::time::timeout(Duration::from_secs(5), worker)
                .await
                .expect("worker did not shut down")
                .expect("worker task failed");
        }
    }
}

impl Drop for TaskHarness {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            worker.abort();
        }
    }
}
