// Service endpoints: reset, health, status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::web::{api_error, AppState};

/// POST /api/reset — delete all persisted artifacts.
pub async fn reset(State(state): State<AppState>) -> Response {
    match state.store.reset() {
        Ok(deleted) => Json(serde_json::json!({
            "success": true,
            "message": "Application state reset successfully",
            "deleted_files": deleted,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Reset failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// GET /api/health — liveness check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "Vigil Signal Detection API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/status — pipeline run status.
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.pipeline_status.read().await;
    let message = if status.running {
        "Processing"
    } else {
        "Ready"
    };
    Json(serde_json::json!({
        "message": message,
        "processing": status.running,
        "started_at": status.started_at,
        "last_error": status.last_error,
    }))
}
