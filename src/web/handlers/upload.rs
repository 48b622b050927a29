// POST /api/upload — receive a CSV and run the full pipeline.
//
// The pipeline runs synchronously from the caller's point of view: the
// response carries the top-5 summaries of the freshly processed dataset.
// Only one run may be active at a time; concurrent uploads get 409.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use crate::embedding::onnx::SentenceEmbedder;
use crate::pipeline;
use crate::signal::ClusterSummary;
use crate::web::{api_error, AppState};

pub async fn upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let bytes = match read_csv_field(multipart).await {
        Ok(bytes) => bytes,
        Err(message) => return api_error(StatusCode::BAD_REQUEST, &message),
    };

    // Claim the running flag before touching any artifact
    {
        let mut status = state.pipeline_status.write().await;
        if status.running {
            return api_error(
                StatusCode::CONFLICT,
                "A processing run is already in progress",
            );
        }
        status.running = true;
        status.started_at = Some(Utc::now().to_rfc3339());
        status.last_error = None;
    }

    let result = process_upload(&state, &bytes).await;

    let mut status = state.pipeline_status.write().await;
    status.running = false;

    match result {
        Ok(signals) => {
            status.last_error = None;
            Json(serde_json::json!({
                "success": true,
                "message": "File uploaded and processed successfully",
                "signals": signals,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Processing pipeline failed");
            status.last_error = Some(e.to_string());
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("Processing pipeline failed: {e}"),
            )
        }
    }
}

/// Pull the uploaded CSV bytes out of the multipart body.
async fn read_csv_field(mut multipart: Multipart) -> Result<Vec<u8>, String> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err("No file provided in request".to_string()),
            Err(e) => return Err(format!("Malformed multipart body: {e}")),
        };

        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err("No file selected".to_string());
        }
        if !file_name.to_lowercase().ends_with(".csv") {
            return Err("Invalid file type. Only CSV files are allowed.".to_string());
        }

        return match field.bytes().await {
            Ok(bytes) if bytes.is_empty() => Err("Uploaded file is empty".to_string()),
            Ok(bytes) => Ok(bytes.to_vec()),
            Err(e) => Err(format!("Failed to read upload: {e}")),
        };
    }
}

/// Stage the upload and run the pipeline end to end.
async fn process_upload(state: &AppState, bytes: &[u8]) -> anyhow::Result<Vec<ClusterSummary>> {
    state.store.ensure_dir()?;
    let dataset_path = state.store.dataset_path();
    std::fs::write(&dataset_path, bytes)?;

    state.config.require_model()?;
    let embedder = SentenceEmbedder::load(&state.config.model_dir)?;

    let outcome = pipeline::run(&state.config, &state.store, &embedder, &dataset_path).await?;
    Ok(outcome.summaries)
}
