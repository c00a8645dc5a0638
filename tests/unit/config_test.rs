//! Configuration loading and how it reaches the layer and the filters.

use corrid::observability::filter::CorrelationIdFilter;
use corrid::{CorrelationConfig, CorrelationError, CorrelationIdLayer};

#[test]
fn test_partial_json_falls_back_to_defaults() {
    let config = CorrelationConfig::from_json(r#"{"header_name": "X-Correlation-ID"}"#).unwrap();

    assert_eq!(config.header_name, "X-Correlation-ID");
    assert_eq!(config.response_header(), "X-Correlation-ID");
    assert!(config.validate_header_as_uuid);
    assert!(config.log_invalid_header);
    assert_eq!(config.display_length, 32);
    assert_eq!(config.parent_header_name, "X-Parent-Task-ID");
    assert!(!config.use_task_id_as_current);
}

#[test]
fn test_full_json_round_trips_through_serde() {
    let config = CorrelationConfig::new()
        .with_header_name("X-Trace")
        .with_response_header_name("X-Trace-Out")
        .with_uuid_validation(false)
        .with_display_length(8)
        .with_default_value("none")
        .with_task_id_as_current(true);

    let raw = serde_json::to_string(&config).unwrap();
    assert_eq!(CorrelationConfig::from_json(&raw).unwrap(), config);
}

#[test]
fn test_invalid_header_name_is_rejected() {
    let err = CorrelationConfig::from_json(r#"{"header_name": "not a header"}"#).unwrap_err();
    assert!(matches!(err, CorrelationError::InvalidHeaderName(ref name) if name == "not a header"));

    let config = CorrelationConfig::new().with_parent_header_name("bad\nname");
    assert!(config.validate().is_err());
    assert!(CorrelationIdLayer::from_config(&config).is_err());
}

#[test]
fn test_zero_display_length_is_rejected() {
    let err = CorrelationConfig::from_json(r#"{"display_length": 0}"#).unwrap_err();
    assert!(matches!(err, CorrelationError::InvalidConfig(_)));
}

#[test]
fn test_malformed_json_is_an_error() {
    let err = CorrelationConfig::from_json("{").unwrap_err();
    assert!(matches!(err, CorrelationError::Json(_)));
}

#[test]
fn test_placeholder_follows_display_settings() {
    let filter = CorrelationIdFilter::from_config(&CorrelationConfig::new().with_display_length(5));
    assert_eq!(filter.value(), "-----");

    let filter = CorrelationIdFilter::from_config(&CorrelationConfig::new().with_default_value("n/a"));
    assert_eq!(filter.value(), "n/a");
}
