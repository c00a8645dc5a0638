//! Task envelope shared by the dispatch client, transports and workers.

use crate::ids::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Metadata map travelling with a task.
pub type TaskHeaders = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: TaskId,
    pub name: String,
    pub args: Value,
    #[serde(default)]
    pub headers: TaskHeaders,
}

impl TaskEnvelope {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            id: TaskId::new(Uuid::new_v4().to_string()),
            name: name.into(),
            args,
            headers: TaskHeaders::new(),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }
}
