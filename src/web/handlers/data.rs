// GET /api/data/cleaned — paginated view of the cleaned dataset.
//
// Supports a case-insensitive any-column substring search. Pagination is
// done in Rust after loading — the dataset is an in-memory table, not a
// database.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::signal::SignalError;
use crate::store::ArtifactStore;
use crate::web::AppState;

const DEFAULT_LIMIT: usize = 100;

#[derive(Deserialize, Default)]
pub struct DataQuery {
    /// Page number (1-based)
    pub page: Option<usize>,
    /// Rows per page (default 100)
    pub limit: Option<usize>,
    /// Case-insensitive substring searched across all columns
    pub search: Option<String>,
}

pub async fn get_cleaned_data(
    State(state): State<AppState>,
    Query(params): Query<DataQuery>,
) -> Response {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).max(1);

    let store: ArtifactStore = (*state.store).clone();
    let dataset = tokio::task::spawn_blocking(move || store.load_dataset()).await;

    let dataset = match dataset {
        Ok(Ok(dataset)) => dataset,
        // No dataset yet — an empty page, not an error
        Ok(Err(SignalError::DatasetMissing)) => {
            return Json(serde_json::json!({
                "data": [],
                "total": 0,
                "page": 1,
                "limit": limit,
            }))
            .into_response();
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to load dataset");
            return crate::web::api_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                &e.to_string(),
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Dataset load panicked");
            return crate::web::api_error(
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            );
        }
    };

    let search = params.search.unwrap_or_default().to_lowercase();
    let matching: Vec<&Vec<String>> = dataset
        .rows
        .iter()
        .filter(|row| {
            search.is_empty()
                || row
                    .iter()
                    .any(|cell| cell.to_lowercase().contains(&search))
        })
        .collect();

    let total = matching.len();
    let offset = (page - 1) * limit;

    let data: Vec<Value> = matching
        .into_iter()
        .skip(offset)
        .take(limit)
        .map(|row| {
            let mut object = Map::new();
            for (column, cell) in dataset.columns.iter().zip(row.iter()) {
                object.insert(column.clone(), Value::String(cell.clone()));
            }
            Value::Object(object)
        })
        .collect();

    Json(serde_json::json!({
        "data": data,
        "total": total,
        "page": page,
        "limit": limit,
    }))
    .into_response()
}
