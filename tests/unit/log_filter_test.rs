//! Log enrichment as seen in formatted output.

use corrid::core::correlation::sync_with_correlation_id;
use corrid::core::lineage::sync_with_lineage;
use corrid::observability::{
    CORRELATION_ID_FIELD, CURRENT_ID_FIELD, CorrelationFormat, JsonCorrelationFormat,
    PARENT_ID_FIELD,
};
use serde_json::Value;
use corrid::{CorrelationConfig, CorrelationContext, CorrelationId, TaskExecutionId, TaskLineage};
use test_support::common::{LogCapture, capture_subscriber, parse_prefixed_line};

fn logged<F: FnOnce()>(config: &CorrelationConfig, f: F) -> Vec<String> {
    let capture = LogCapture::new();
    tracing::subscriber::with_default(capture_subscriber(config, capture.clone()), f);
    capture.lines()
}

#[test]
fn test_placeholders_when_nothing_is_bound() {
    let lines = logged(&CorrelationConfig::default(), || {
        tracing::info!("startup complete");
    });

    let (values, message) = parse_prefixed_line(&lines[0]);
    let dashes = "-".repeat(32);
    assert_eq!(values, vec![dashes.clone(), format!("{dashes}-{dashes}")]);
    assert!(message.contains("startup complete"));
}

#[test]
fn test_bound_correlation_id_prefixes_line() {
    let lines = logged(&CorrelationConfig::default(), || {
        sync_with_correlation_id(CorrelationId::from("abc"), || {
            tracing::info!(user = 7, "handling");
        });
        tracing::info!("after");
    });

    let (values, message) = parse_prefixed_line(&lines[0]);
    assert_eq!(values[0], "abc");
    assert!(message.contains("handling"));
    assert!(message.contains("user=7"));

    let (values, _) = parse_prefixed_line(&lines[1]);
    assert_eq!(values[0], "-".repeat(32));
}

#[test]
fn test_long_ids_are_truncated_for_display() {
    let config = CorrelationConfig::new().with_display_length(8);
    let lines = logged(&config, || {
        sync_with_correlation_id(CorrelationId::from("0123456789abcdef"), || {
            tracing::warn!("slow request");
        });
    });

    let (values, _) = parse_prefixed_line(&lines[0]);
    assert_eq!(values[0], "01234567");
}

#[test]
fn test_lineage_fields_render_parent_then_current() {
    let lineage = TaskLineage::new(
        TaskExecutionId::from("child"),
        Some(TaskExecutionId::from("parent")),
    );
    let context = CorrelationContext::new()
        .with_correlation_id(CorrelationId::from("req"))
        .with_lineage(lineage);

    let lines = logged(&CorrelationConfig::default(), || {
        context.sync_scope(|| tracing::info!("in task"));
    });

    let (values, _) = parse_prefixed_line(&lines[0]);
    assert_eq!(values, vec!["req", "parent-child"]);
}

#[test]
fn test_root_task_shows_placeholder_parent() {
    let config = CorrelationConfig::new().with_default_value("none");
    let lines = logged(&config, || {
        sync_with_lineage(TaskLineage::root(TaskExecutionId::from("root")), || {
            tracing::info!("root task");
        });
    });

    let (values, _) = parse_prefixed_line(&lines[0]);
    assert_eq!(values, vec!["none", "none-root"]);
}

#[test]
fn test_enrich_exposes_named_fields() {
    let format = CorrelationFormat::from_config(&CorrelationConfig::default());
    let fields = sync_with_correlation_id(CorrelationId::from("xyz"), || format.enrich());

    assert_eq!(fields.len(), 3);
    assert_eq!(fields.get(CORRELATION_ID_FIELD), Some("xyz"));
    assert_eq!(fields.get(PARENT_ID_FIELD), Some("-".repeat(32).as_str()));
    assert_eq!(fields.get(CURRENT_ID_FIELD), Some("-".repeat(32).as_str()));
}

#[test]
fn test_json_output_names_every_field() {
    let capture = LogCapture::new();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_writer(move || writer.clone())
        .event_format(JsonCorrelationFormat::from_config(&CorrelationConfig::default()))
        .finish();

    let lineage = TaskLineage::new(
        TaskExecutionId::from("child"),
        Some(TaskExecutionId::from("parent")),
    );
    let context = CorrelationContext::new()
        .with_correlation_id(CorrelationId::from("req"))
        .with_lineage(lineage);

    tracing::subscriber::with_default(subscriber, || {
        context.sync_scope(|| tracing::info!("in task"));
    });

    let lines = capture.lines();
    assert_eq!(lines.len(), 1);
    let event: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(event[CORRELATION_ID_FIELD], "req");
    assert_eq!(event[PARENT_ID_FIELD], "parent");
    assert_eq!(event[CURRENT_ID_FIELD], "child");
    assert_eq!(event["fields"]["message"], "in task");
}
