// GET /api/metrics — the accumulated metrics document.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::metrics;
use crate::web::AppState;

pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match metrics::load(&state.store.metrics_path()) {
        Some(document) => Json(serde_json::json!({ "metrics": document })).into_response(),
        None => Json(serde_json::json!({ "metrics": null })).into_response(),
    }
}
