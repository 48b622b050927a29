// Signal detection — the scoring and summarization core.
//
// The engine joins cluster labels onto the cleaned dataset and computes
// per-cluster statistics; the summarizer turns the ranked statistics into
// reviewer-facing narratives. Both share the column-discovery conventions
// in `columns`.

pub mod columns;
pub mod engine;
pub mod summary;

use serde::{Deserialize, Serialize};

/// Failures that terminate a signal-detection run.
///
/// Missing artifacts map to 404 + "please upload/process first" at the API
/// layer. Everything else (I/O, malformed artifacts) flows through `Other`.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Clusters not found. Please upload and process a dataset first.")]
    ClusterDataMissing,
    #[error("Dataset not found. Please upload a CSV file first.")]
    DatasetMissing,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Per-cluster statistics, one entry per distinct non-noise cluster.
///
/// `signal_score = frequency * severity * growth_rate` — the ranking key
/// for the persisted signals table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterStats {
    pub cluster: i32,
    pub frequency: u64,
    pub severity: f64,
    pub growth_rate: f64,
    pub signal_score: f64,
}

/// A top-ranked cluster with its narrative, as served by the API.
/// Never persisted — recomputed from the statistics on each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: i32,
    pub frequency: u64,
    pub severity: f64,
    pub growth_rate: f64,
    pub signal_score: f64,
    pub top_adverse_events: Vec<String>,
    pub summary: String,
}
