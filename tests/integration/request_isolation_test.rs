//! Concurrent requests never observe each other's correlation id.

use axum::Router;
use axum::body::Body;
use axum::extract::Path;
use axum::routing::get;
use corrid::core::context;
use corrid::{CorrelationConfig, CorrelationIdLayer, current_correlation_id};
use http::Request;
use std::time::Duration;
use test_support::common::{LogCapture, capture_subscriber, parse_prefixed_line};
use tokio::task::JoinSet;
use tower::ServiceExt;

const REQUESTS: usize = 50;

async fn handle(Path(input): Path<usize>) -> String {
    // Interleave with the other in-flight requests.
    for _ in 0..(input % 7) {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis((input % 3) as u64)).await;
    tracing::info!(input, "handled");

    let background = context::spawn(async move {
        tokio::task::yield_now().await;
        tracing::info!(input, "background work");
        current_correlation_id()
    });
    let inherited = background.await.ok().flatten();

    inherited.map(|id| id.into_string()).unwrap_or_default()
}

fn app(config: &CorrelationConfig) -> Router {
    Router::new()
        .route("/work/:input", get(handle))
        .layer(CorrelationIdLayer::from_config(config).unwrap())
}

#[tokio::test]
async fn test_concurrent_requests_log_only_their_own_id() {
    let config = CorrelationConfig::new().with_uuid_validation(false);
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&config, capture.clone()));
    let router = app(&config);

    let mut requests = JoinSet::new();
    for input in 0..REQUESTS {
        let router = router.clone();
        requests.spawn(async move {
            let request = Request::builder()
                .uri(format!("/work/{input}"))
                .header("X-Request-ID", format!("req-{input}"))
                .body(Body::empty())
                .unwrap();
            let response = router.oneshot(request).await.unwrap();
            let header = response.headers()["x-request-id"].to_str().unwrap().to_string();
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (input, header, String::from_utf8(body.to_vec()).unwrap())
        });
    }

    while let Some(result) = requests.join_next().await {
        let (input, header, inherited) = result.unwrap();
        assert_eq!(header, format!("req-{input}"));
        assert_eq!(inherited, format!("req-{input}"));
    }

    let handled = capture.lines_containing("handled");
    let background = capture.lines_containing("background work");
    assert_eq!(handled.len(), REQUESTS);
    assert_eq!(background.len(), REQUESTS);

    for line in handled.iter().chain(background.iter()) {
        let (values, message) = parse_prefixed_line(line);
        let input: usize = message
            .split("input=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.parse().ok())
            .unwrap_or_else(|| panic!("no input field in {line:?}"));
        assert_eq!(values[0], format!("req-{input}"), "line: {line}");
    }

    assert_eq!(current_correlation_id(), None);
}

#[tokio::test]
async fn test_concurrent_generated_ids_are_distinct() {
    let router = app(&CorrelationConfig::default());

    let mut requests = JoinSet::new();
    for input in 0..REQUESTS {
        let router = router.clone();
        requests.spawn(async move {
            let request = Request::builder()
                .uri(format!("/work/{input}"))
                .body(Body::empty())
                .unwrap();
            let response = router.oneshot(request).await.unwrap();
            response.headers()["x-request-id"].to_str().unwrap().to_string()
        });
    }

    let mut seen = std::collections::HashSet::new();
    while let Some(result) = requests.join_next().await {
        assert!(seen.insert(result.unwrap()));
    }
    assert_eq!(seen.len(), REQUESTS);
}
