// Web server — Axum-based REST API over the pipeline and its artifacts.
//
// Upload triggers a full pipeline run and answers with the top signal
// summaries; the read endpoints serve (or recompute from) the persisted
// artifacts without retriggering the pipeline. Runs are serialized by a
// shared running flag — a second upload while one is processing gets 409.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::store::ArtifactStore;

pub mod handlers;

/// Uploads can be large adverse-event exports — allow up to 1 GiB.
const MAX_UPLOAD_BYTES: usize = 1024 * 1024 * 1024;

/// Live status of the pipeline, exposed via GET /api/status.
#[derive(Debug, Clone, Default)]
pub struct PipelineStatus {
    /// True while an upload-triggered run is in progress.
    pub running: bool,
    /// ISO 8601 timestamp of when the current/last run started.
    pub started_at: Option<String>,
    /// Error message from the last run, if it failed.
    pub last_error: Option<String>,
}

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<ArtifactStore>,
    pub pipeline_status: Arc<RwLock<PipelineStatus>>,
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(config: Config, port: u16, bind: &str) -> Result<()> {
    let store = ArtifactStore::new(config.data_dir.clone());
    store.ensure_dir()?;

    let state = AppState {
        config: Arc::new(config),
        store: Arc::new(store),
        pipeline_status: Arc::new(RwLock::new(PipelineStatus::default())),
    };

    let app = build_router(state);

    let addr = format!("{bind}:{port}");
    info!("Vigil API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/upload", post(handlers::upload::upload))
        .route("/api/signals", get(handlers::signals::get_signals))
        .route(
            "/api/signals/summaries",
            get(handlers::signals::get_summaries),
        )
        .route("/api/signals/top", get(handlers::signals::get_top_signals))
        .route("/api/clusters", get(handlers::signals::get_clusters))
        .route("/api/data/cleaned", get(handlers::data::get_cleaned_data))
        .route("/api/metrics", get(handlers::metrics::get_metrics))
        .route("/api/reset", post(handlers::admin::reset))
        .route("/api/health", get(handlers::admin::health))
        .route("/api/status", get(handlers::admin::get_status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (
        status,
        axum::Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}
