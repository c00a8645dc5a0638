//! Binding lifetime across sequential requests, faults included.

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::StatusCode;
use axum::routing::get;
use corrid::observability::filter::CorrelationIdFilter;
use corrid::{CorrelationConfig, CorrelationIdLayer, current_correlation_id};
use http::{Request, Response};
use test_support::common::{LogCapture, capture_subscriber, parse_prefixed_line};
use tower::ServiceExt;

const VALID_UUID: &str = "9c1b2a4e-6f3d-4c8a-9b7e-1d2f3a4b5c6d";

async fn filter_value() -> String {
    tracing::info!("rendering");
    CorrelationIdFilter::new().value()
}

async fn failing() -> (StatusCode, &'static str) {
    tracing::error!("database unavailable");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn app() -> Router {
    Router::new()
        .route("/", get(filter_value))
        .route("/fail", get(failing))
        .layer(CorrelationIdLayer::new())
}

fn request(path: &str, id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(id) = id {
        builder = builder.header("X-Request-ID", id);
    }
    builder.body(Body::empty()).unwrap()
}

fn response_id(response: &Response<Body>) -> String {
    response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_filter_value_matches_response_header() {
    let response = app().oneshot(request("/", None)).await.unwrap();
    let id = response_id(&response);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), id);
}

#[tokio::test]
async fn test_sequential_requests_do_not_leak() {
    let capture = LogCapture::new();
    let config = CorrelationConfig::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&config, capture.clone()));
    let router = app();

    let first = router.clone().oneshot(request("/", Some(VALID_UUID))).await.unwrap();
    assert_eq!(response_id(&first), VALID_UUID);
    assert_eq!(current_correlation_id(), None);
    tracing::info!("between requests");

    let second = router.oneshot(request("/", None)).await.unwrap();
    let second_id = response_id(&second);
    assert_ne!(second_id, VALID_UUID);

    let lines = capture.lines_containing("rendering");
    assert_eq!(parse_prefixed_line(&lines[0]).0[0], VALID_UUID);
    assert_eq!(parse_prefixed_line(&lines[1]).0[0], second_id);

    let between = capture.lines_containing("between requests");
    assert_eq!(parse_prefixed_line(&between[0]).0[0], "-".repeat(32));
}

#[tokio::test]
async fn test_failed_request_is_stamped_and_cleared() {
    let capture = LogCapture::new();
    let config = CorrelationConfig::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&config, capture.clone()));
    let router = app();

    let failed = router.clone().oneshot(request("/fail", Some(VALID_UUID))).await.unwrap();
    assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response_id(&failed), VALID_UUID);
    assert_eq!(
        failed.headers()["access-control-expose-headers"],
        "X-Request-ID"
    );
    assert_eq!(current_correlation_id(), None);

    let error_line = &capture.lines_containing("database unavailable")[0];
    assert_eq!(parse_prefixed_line(error_line).0[0], VALID_UUID);

    let next = router.oneshot(request("/", None)).await.unwrap();
    let next_id = response_id(&next);
    assert_ne!(next_id, VALID_UUID);
    let body = to_bytes(next.into_body(), usize::MAX).await.unwrap();
    assert_eq!(String::from_utf8(body.to_vec()).unwrap(), next_id);
}
