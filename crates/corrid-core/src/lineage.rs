//! Task lineage propagation.
//!
//! Each task execution carries its own id and the id of the task that
//! dispatched it, forming a tree that is independent from the flat
//! correlation id.

use crate::ids::TaskExecutionId;

tokio::task_local! {
    static TASK_LINEAGE: TaskLineage;
}

/// (current, parent) id pair of one task execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLineage {
    pub current_id: TaskExecutionId,
    pub parent_id: Option<TaskExecutionId>,
}

impl TaskLineage {
    pub fn new(current_id: TaskExecutionId, parent_id: Option<TaskExecutionId>) -> Self {
        Self {
            current_id,
            parent_id,
        }
    }

    /// Lineage of a task started directly from a request, with no parent task.
    pub fn root(current_id: TaskExecutionId) -> Self {
        Self::new(current_id, None)
    }
}

pub fn current_lineage() -> Option<TaskLineage> {
    TASK_LINEAGE.try_with(|lineage| lineage.clone()).ok()
}

pub fn current_task_id() -> Option<TaskExecutionId> {
    TASK_LINEAGE
        .try_with(|lineage| lineage.current_id.clone())
        .ok()
}

pub fn parent_task_id() -> Option<TaskExecutionId> {
    TASK_LINEAGE
        .try_with(|lineage| lineage.parent_id.clone())
        .ok()
        .flatten()
}

pub async fn with_lineage<F, T>(lineage: TaskLineage, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    TASK_LINEAGE.scope(lineage, fut).await
}

pub fn sync_with_lineage<F, T>(lineage: TaskLineage, f: F) -> T
where
    F: FnOnce() -> T,
{
    TASK_LINEAGE.sync_scope(lineage, f)
}
