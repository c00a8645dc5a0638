use thiserror::Error;

#[derive(Debug, Error)]
pub enum CorrelationError {
    #[error("correlation id is empty")]
    Empty,

    #[error("correlation id rejected by validator: {0}")]
    Rejected(String),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("task transport error: {0}")]
    Transport(String),

    #[error("no handler registered for task: {0}")]
    UnknownTask(String),

    #[error("task failed: {0}")]
    TaskFailed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CorrelationError>;
