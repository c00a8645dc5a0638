//! Execution side of the task runtime.

use crate::client::TaskClient;
use crate::handler::{TaskContext, TaskHandler};
use corrid_core::{CorrelationError, Result, TaskEnvelope};
use corrid_observability::spans;
use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::Instrument;

pub struct Worker {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    client: TaskClient,
}

impl Worker {
    /// Create a worker sharing `client`'s interceptors.
    ///
    /// Handlers receive `client` in their [`TaskContext`] for nested dispatch.
    pub fn new(client: TaskClient) -> Self {
        Self {
            handlers: HashMap::new(),
            client,
        }
    }

    pub fn with_handler<H: TaskHandler>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.register_handler(name, handler);
        self
    }

    pub fn register_handler<H: TaskHandler>(&mut self, name: impl Into<String>, handler: H) {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Execute one received task.
    ///
    /// The start interceptors decide the bindings; the handler and the
    /// completion interceptors run inside them, and the bindings end with
    /// this call on every exit path. A panicking handler is reported as
    /// [`CorrelationError::TaskFailed`].
    pub async fn execute(&self, task: TaskEnvelope) -> Result<Value> {
        let handler = self
            .handlers
            .get(&task.name)
            .cloned()
            .ok_or_else(|| CorrelationError::UnknownTask(task.name.clone()))?;

        let interceptors = self.client.interceptors();
        let context = interceptors.on_task_start(&task);
        let span = spans::task_execution(&task.name, task.id.as_str());
        let task_context = TaskContext {
            task_id: task.id.clone(),
            name: task.name.clone(),
            client: self.client.clone(),
        };

        context
            .scope(
                async move {
                    interceptors.notify_task_run(&task);
                    let result = AssertUnwindSafe(handler.run(task_context, task.args.clone()))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            Err(CorrelationError::TaskFailed(format!(
                                "handler panicked: {}",
                                panic_message(panic.as_ref())
                            )))
                        });
                    interceptors.notify_task_complete(&task, &result);
                    result
                }
                .instrument(span),
            )
            .await
    }

    /// Consume envelopes until the channel closes, one tokio task each.
    ///
    /// A worker built on an [`InMemoryTransport`] keeps its own sender, so
    /// its channel never closes; use [`Worker::run_until`] to stop it.
    ///
    /// [`InMemoryTransport`]: crate::InMemoryTransport
    pub async fn run(self: Arc<Self>, receiver: mpsc::UnboundedReceiver<TaskEnvelope>) {
        self.run_until(receiver, std::future::pending()).await
    }

    /// Consume envelopes until `shutdown` resolves or the channel closes.
    ///
    /// On shutdown the channel is closed, envelopes already queued are still
    /// executed, and the call returns once every spawned task has finished.
    pub async fn run_until<F>(
        self: Arc<Self>,
        mut receiver: mpsc::UnboundedReceiver<TaskEnvelope>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut running = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(in_flight = running.len(), "worker shutting down");
                    receiver.close();
                    break;
                }
                task = receiver.recv() => match task {
                    Some(task) => self.spawn_task(&mut running, task),
                    None => break,
                },
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    log_join_error(joined);
                }
            }
        }

        // After close() this yields the envelopes already queued, then None.
        while let Some(task) = receiver.recv().await {
            self.spawn_task(&mut running, task);
        }
        while let Some(joined) = running.join_next().await {
            log_join_error(joined);
        }
    }

    fn spawn_task(self: &Arc<Self>, running: &mut JoinSet<()>, task: TaskEnvelope) {
        let worker = self.clone();
        running.spawn(async move {
            let name = task.name.clone();
            if let Err(e) = worker.execute(task).await {
                tracing::warn!(task = %name, error = %e, "task execution failed");
            }
        });
    }
}

fn log_join_error(joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "task panicked or was cancelled");
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
