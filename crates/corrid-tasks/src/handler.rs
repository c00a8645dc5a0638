//! Task handler trait and closure adapter.

use crate::client::TaskClient;
use async_trait::async_trait;
use corrid_core::{Result, TaskId};
use serde_json::Value;
use std::future::Future;

/// What a running task knows about itself.
#[derive(Clone)]
pub struct TaskContext {
    pub task_id: TaskId,
    pub name: String,
    /// Client for dispatching follow-up tasks from inside this one
    pub client: TaskClient,
}

#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    async fn run(&self, context: TaskContext, args: Value) -> Result<Value>;
}

pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a [`TaskHandler`].
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(TaskContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> TaskHandler for FnHandler<F>
where
    F: Fn(TaskContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    async fn run(&self, context: TaskContext, args: Value) -> Result<Value> {
        (self.f)(context, args).await
    }
}
