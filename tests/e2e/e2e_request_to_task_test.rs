//! An HTTP request that dispatches a chain of tasks: the request's
//! correlation id reaches every task and the lineage links each task to the
//! one that dispatched it.

use axum::body::{Body, to_bytes};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use corrid::{CorrelationConfig, CorrelationIdLayer, TaskClient, current_correlation_id};
use http::Request;
use serde_json::{Value, json};
use test_support::common::{LogCapture, capture_subscriber, parse_prefixed_line};
use test_support::support::tasks::TaskHarness;
use tower::ServiceExt;

async fn submit(State(client): State<TaskClient>, Path(name): Path<String>) -> (StatusCode, Json<Value>) {
    tracing::info!(job = %name, "submitting");
    match client.dispatch(&name, json!({})).await {
        Ok(task_id) => (StatusCode::ACCEPTED, Json(json!({"task_id": task_id}))),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": e.to_string()})),
        ),
    }
}

fn app(config: &CorrelationConfig, client: TaskClient) -> Router {
    Router::new()
        .route("/jobs/:name", post(submit))
        .with_state(client)
        .layer(CorrelationIdLayer::from_config(config).unwrap())
}

fn submit_request(name: &str, id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(format!("/jobs/{name}"));
    if let Some(id) = id {
        builder = builder.header("X-Request-ID", id);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_request_id_flows_through_task_chain() {
    let config = CorrelationConfig::new().with_uuid_validation(false);
    let capture = LogCapture::new();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&config, capture.clone()));

    let mut harness = TaskHarness::chain(&config, &["ingest", "transform", "publish"]);
    let response = app(&config, harness.client.clone())
        .oneshot(submit_request("ingest", Some("order-42")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["x-request-id"], "order-42");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["task_id"].as_str().is_some());

    let ingest = harness.next_observation().await;
    let transform = harness.next_observation().await;
    let publish = harness.next_observation().await;

    for observation in [&ingest, &transform, &publish] {
        assert_eq!(
            observation.correlation_id.as_ref().map(|id| id.as_str()),
            Some("order-42")
        );
    }
    assert_eq!(ingest.parent_id, None);
    assert_eq!(transform.parent_id, ingest.current_id);
    assert_eq!(publish.parent_id, transform.current_id);

    // The request side is released once the response is out.
    assert_eq!(current_correlation_id(), None);

    let submitting = capture.lines_containing("submitting");
    let (values, _) = parse_prefixed_line(&submitting[0]);
    let dashes = "-".repeat(32);
    assert_eq!(values, vec!["order-42".to_string(), format!("{dashes}-{dashes}")]);

    let transform_current = transform.current_id.unwrap().into_string();
    let ingest_current = ingest.current_id.unwrap().into_string();
    let transform_line = capture
        .lines_containing("running task")
        .into_iter()
        .find(|line| line.contains("task=transform"))
        .expect("transform task logged");
    let (values, _) = parse_prefixed_line(&transform_line);
    assert_eq!(
        values,
        vec!["order-42".to_string(), format!("{ingest_current}-{transform_current}")]
    );
}

#[tokio::test]
async fn test_generated_request_id_reaches_tasks() {
    let config = CorrelationConfig::default();
    let mut harness = TaskHarness::chain(&config, &["single"]);

    let response = app(&config, harness.client.clone())
        .oneshot(submit_request("single", None))
        .await
        .unwrap();
    let id = response.headers()["x-request-id"]
        .to_str()
        .unwrap()
        .to_string();

    let observation = harness.next_observation().await;
    assert_eq!(
        observation.correlation_id.map(|id| id.into_string()),
        Some(id)
    );
    assert_eq!(observation.parent_id, None);
}

#[tokio::test]
async fn test_separate_requests_start_separate_chains() {
    let config = CorrelationConfig::new().with_uuid_validation(false);
    let mut harness = TaskHarness::chain(&config, &["step"]);
    let router = app(&config, harness.client.clone());

    for id in ["first-request", "second-request"] {
        let response = router
            .clone()
            .oneshot(submit_request("step", Some(id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let observation = harness.next_observation().await;
        assert_eq!(
            observation.correlation_id.as_ref().map(|id| id.as_str()),
            Some(id)
        );
    }
}
