//! Correlation ID demo service
//!
//! Serves a small HTTP API behind `CorrelationIdLayer`. `POST /jobs/:name`
//! dispatches a task to an in-process worker; every log line, on the request
//! side and the worker side, is prefixed with the request's correlation id
//! and the task lineage.

use anyhow::Context as _;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use clap::{Parser, Subcommand};
use corrid::{
    CorrelationConfig, CorrelationError, CorrelationIdLayer, InMemoryTransport, InterceptorRegistry,
    RequestCorrelationId, TaskClient, Worker, handler_fn, init_json_tracing, init_tracing,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "corrid-demo")]
#[command(about = "Correlation id propagation demo service", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file (fields not set fall back to defaults)
    #[arg(short, long, env = "CORRID_CONFIG")]
    config: Option<PathBuf>,

    /// Request header carrying the correlation id
    #[arg(long, env = "CORRID_HEADER_NAME")]
    header_name: Option<String>,

    /// Accept any non-empty header value instead of requiring a UUID
    #[arg(long, env = "CORRID_ACCEPT_ANY")]
    accept_any: bool,

    /// Emit one JSON object per log event
    #[arg(long, env = "CORRID_JSON_LOGS")]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service with an in-process worker
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        listen: String,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Clone)]
struct AppState {
    tasks: TaskClient,
}

fn load_config(cli: &Cli) -> anyhow::Result<CorrelationConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            CorrelationConfig::from_json(&raw)?
        }
        None => CorrelationConfig::default(),
    };
    if let Some(name) = &cli.header_name {
        config = config.with_header_name(name.clone());
    }
    if cli.accept_any {
        config = config.with_uuid_validation(false);
    }
    config.validate()?;
    Ok(config)
}

async fn health(RequestCorrelationId(id): RequestCorrelationId) -> Json<Value> {
    info!("health check");
    Json(json!({"status": "ok", "correlation_id": id}))
}

async fn submit_job(
    State(state): State<AppState>,
    Path(name): Path<String>,
    RequestCorrelationId(id): RequestCorrelationId,
    Json(args): Json<Value>,
) -> (StatusCode, Json<Value>) {
    info!(job = %name, "submitting job");
    match state.tasks.dispatch(&name, args).await {
        Ok(task_id) => (
            StatusCode::ACCEPTED,
            Json(json!({"task_id": task_id, "correlation_id": id})),
        ),
        Err(e) => {
            warn!(job = %name, error = %e, "job dispatch failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"error": e.to_string(), "correlation_id": id})),
            )
        }
    }
}

fn build_worker(client: TaskClient) -> Worker {
    Worker::new(client)
        .with_handler(
            "report",
            handler_fn(|ctx, args| async move {
                info!(task = %ctx.name, "building report");
                ctx.client.dispatch("notify", json!({"report": args})).await?;
                Ok::<_, CorrelationError>(json!({"status": "built"}))
            }),
        )
        .with_handler(
            "notify",
            handler_fn(|ctx, _args| async move {
                info!(task = %ctx.name, "sending notification");
                Ok::<_, CorrelationError>(json!({"status": "sent"}))
            }),
        )
}

async fn serve(config: CorrelationConfig, listen: &str) -> anyhow::Result<()> {
    let registry = Arc::new(InterceptorRegistry::with_correlation(&config));
    let (transport, receiver) = InMemoryTransport::channel();
    let client = TaskClient::new(Arc::new(transport), registry);

    let worker = Arc::new(build_worker(client.clone()));
    info!(handlers = ?worker.handler_names(), "starting worker");
    let (stop, mut stopped) = watch::channel(false);
    let worker = tokio::spawn(worker.run_until(receiver, async move {
        let _ = stopped.changed().await;
    }));

    let app = Router::new()
        .route("/health", get(health))
        .route("/jobs/:name", post(submit_job))
        .with_state(AppState { tasks: client })
        .layer(CorrelationIdLayer::from_config(&config)?);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(address = %listen, header = %config.header_name, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = stop.send(true);
    worker.await?;
    info!("worker drained, exiting");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Serve { listen } => {
            if cli.json_logs {
                init_json_tracing(&config);
            } else {
                init_tracing(&config);
            }
            serve(config, listen).await
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
