//! Standard tracing subscriber setup for binaries.

use crate::format::{CorrelationFormat, JsonCorrelationFormat};
use corrid_core::CorrelationConfig;

/// Initialize a tracing subscriber with env-based filtering and
/// correlation-prefixed output.
///
/// Default directive: `corrid=info` (covers every `corrid_*` crate).
pub fn init_tracing(config: &CorrelationConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .event_format(CorrelationFormat::from_config(config))
        .init();
}

/// Like [`init_tracing`], but one JSON object per event with the
/// `correlation_id`, `celery_parent_id` and `celery_current_id` keys.
pub fn init_json_tracing(config: &CorrelationConfig) {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(default_filter())
        .event_format(JsonCorrelationFormat::from_config(config))
        .init();
}

fn default_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("corrid=info".parse().unwrap_or_default())
}
