// Signal endpoints.
//
// GET /api/signals           — top-5 summaries, recomputed from artifacts
// GET /api/signals/summaries — same, with a ?top_n= parameter
// GET /api/signals/top       — ranked rows from the persisted table only
// GET /api/clusters          — the full persisted ranked table
//
// The recomputing endpoints run the signal engine over the persisted
// dataset + label artifacts; they never retrigger embedding or clustering.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::signal::summary::{self, DEFAULT_TOP_N};
use crate::signal::{engine, ClusterSummary, SignalError};
use crate::store::ArtifactStore;
use crate::web::{api_error, AppState};

#[derive(Deserialize, Default)]
pub struct TopNQuery {
    pub top_n: Option<usize>,
}

/// GET /api/signals — top-5 cluster summaries.
pub async fn get_signals(State(state): State<AppState>) -> Response {
    match compute_summaries(&state, DEFAULT_TOP_N).await {
        Ok(signals) => Json(serde_json::json!({
            "success": true,
            "signals": signals,
        }))
        .into_response(),
        Err(e) => signal_error_response(e),
    }
}

/// GET /api/signals/summaries?top_n=N — parameterized summary count.
pub async fn get_summaries(
    State(state): State<AppState>,
    Query(params): Query<TopNQuery>,
) -> Response {
    let top_n = params.top_n.unwrap_or(DEFAULT_TOP_N);
    match compute_summaries(&state, top_n).await {
        Ok(summaries) => Json(serde_json::json!({ "summaries": summaries })).into_response(),
        Err(e) => signal_error_response(e),
    }
}

/// GET /api/signals/top?top_n=N — ranked rows from the persisted table.
pub async fn get_top_signals(
    State(state): State<AppState>,
    Query(params): Query<TopNQuery>,
) -> Response {
    let top_n = params.top_n.unwrap_or(DEFAULT_TOP_N);
    match state.store.load_signals() {
        Ok(Some(mut stats)) => {
            stats.truncate(top_n);
            Json(serde_json::json!({ "signals": stats })).into_response()
        }
        Ok(None) => Json(serde_json::json!({ "signals": [] })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read signals table");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// GET /api/clusters — the full persisted ranked table.
pub async fn get_clusters(State(state): State<AppState>) -> Response {
    match state.store.load_signals() {
        Ok(Some(stats)) => Json(serde_json::json!({ "clusters": stats })).into_response(),
        Ok(None) => Json(serde_json::json!({ "clusters": [] })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read signals table");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

/// Run the signal engine + summarizer against the persisted artifacts.
async fn compute_summaries(
    state: &AppState,
    top_n: usize,
) -> Result<Vec<ClusterSummary>, SignalError> {
    let store: ArtifactStore = (*state.store).clone();
    tokio::task::spawn_blocking(move || {
        let (stats, labeled) = engine::detect_signals(&store)?;
        Ok(summary::summarize_clusters(&stats, &labeled, top_n))
    })
    .await
    .map_err(|e| SignalError::Other(anyhow::anyhow!("signal computation panicked: {e}")))?
}

/// Map a SignalError onto the right HTTP response: missing artifacts are
/// 404 with the "please upload first" message, everything else is 500.
pub fn signal_error_response(error: SignalError) -> Response {
    match error {
        SignalError::ClusterDataMissing | SignalError::DatasetMissing => {
            api_error(StatusCode::NOT_FOUND, &error.to_string())
        }
        SignalError::Other(e) => {
            tracing::error!(error = %e, "Signal detection failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Error retrieving signals: {e}"),
            )
        }
    }
}
