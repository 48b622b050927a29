// Signal engine — per-cluster frequency/severity/growth statistics.
//
// Joins the persisted cluster labels onto the cleaned dataset, aggregates
// per cluster (noise points excluded), and persists the ranked table.
// All per-value coercion failures degrade to documented defaults; only
// missing artifacts terminate the run.

use std::cmp::Ordering;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::dataset::{Dataset, LabeledDataset};
use crate::store::ArtifactStore;

use super::columns::{self, ColumnRole};
use super::{ClusterStats, SignalError};

/// Detect safety signals from the persisted dataset and cluster labels.
///
/// Loads both artifacts, reconciles lengths, computes per-cluster
/// statistics, and persists the ranked table. Returns the statistics
/// together with the joined dataset so the summarizer can reuse it.
pub fn detect_signals(
    store: &ArtifactStore,
) -> Result<(Vec<ClusterStats>, LabeledDataset), SignalError> {
    let dataset = store.load_dataset()?;
    let labels = store.load_labels()?;

    let labeled = join_labels(dataset, labels)?;

    info!(
        reports = labeled.labels.iter().filter(|&&l| l != -1).count(),
        "Analyzing clustered reports (noise points excluded)"
    );

    let stats = compute_cluster_stats(&labeled);
    store.save_signals(&stats)?;

    Ok((stats, labeled))
}

/// Attach one cluster label per row.
///
/// A label vector longer than the dataset is truncated to the dataset
/// length — this tolerates clustering artifacts produced against a
/// pre-cleaning row count. The truncation is surfaced via a warning and
/// the `truncated_labels` count rather than silently. A label vector
/// shorter than the dataset cannot be reconciled and is an error.
pub fn join_labels(dataset: Dataset, mut labels: Vec<i32>) -> Result<LabeledDataset, SignalError> {
    let mut truncated = 0;
    match labels.len().cmp(&dataset.len()) {
        Ordering::Greater => {
            truncated = labels.len() - dataset.len();
            warn!(
                labels = labels.len(),
                rows = dataset.len(),
                discarded = truncated,
                "Cluster label count exceeds dataset rows, truncating labels"
            );
            labels.truncate(dataset.len());
        }
        Ordering::Less => {
            return Err(SignalError::Other(anyhow::anyhow!(
                "Cluster label count ({}) is smaller than the dataset row count ({}) — \
                 re-run processing to regenerate the clusters",
                labels.len(),
                dataset.len()
            )));
        }
        Ordering::Equal => {}
    }

    Ok(LabeledDataset {
        dataset,
        labels,
        truncated_labels: truncated,
    })
}

/// Compute ranked per-cluster statistics from a joined dataset.
///
/// One entry per distinct non-noise cluster, sorted by signal score
/// descending; ties break toward the lower cluster id so the ranking is
/// deterministic.
pub fn compute_cluster_stats(labeled: &LabeledDataset) -> Vec<ClusterStats> {
    let columns = &labeled.dataset.columns;

    let severity_idx = columns::discover(columns, ColumnRole::Severity);
    match severity_idx {
        Some(idx) => info!(column = %columns[idx], "Using severity column"),
        None => warn!("No severity column found, defaulting severity to 1.0"),
    }

    let temporal_idx = columns::discover(columns, ColumnRole::Temporal);
    match temporal_idx {
        Some(idx) => info!(column = %columns[idx], "Using temporal column for growth rate"),
        None => warn!("No date/time column found, defaulting growth rate to 1.0"),
    }

    let mut stats: Vec<ClusterStats> = labeled
        .distinct_clusters()
        .into_iter()
        .map(|cluster| {
            let frequency = labeled.cluster_rows(cluster).count() as u64;

            let severity = severity_idx
                .and_then(|idx| {
                    mean_numeric(labeled.cluster_rows(cluster).map(|row| row[idx].as_str()))
                })
                .unwrap_or(1.0);

            let growth_rate = temporal_idx
                .map(|idx| {
                    cluster_growth_rate(labeled.cluster_rows(cluster).map(|row| row[idx].as_str()))
                })
                .unwrap_or(1.0);

            let signal_score = frequency as f64 * severity * growth_rate;

            ClusterStats {
                cluster,
                frequency,
                severity,
                growth_rate,
                signal_score,
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.signal_score
            .partial_cmp(&a.signal_score)
            .unwrap_or(Ordering::Equal)
            .then(a.cluster.cmp(&b.cluster))
    });

    stats
}

/// Mean of the numerically coercible values, or None when nothing coerces.
fn mean_numeric<'a>(values: impl Iterator<Item = &'a str>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0u64;
    for value in values {
        if let Ok(parsed) = value.trim().parse::<f64>() {
            if parsed.is_finite() {
                sum += parsed;
                count += 1;
            }
        }
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Growth rate for one cluster: recent-half over older-half report counts.
///
/// Unparseable timestamps are dropped; fewer than 2 valid timestamps means
/// no trend can be estimated, so the rate defaults to 1.0. The sorted
/// timestamps are split at the integer midpoint — the recent half includes
/// the middle element when the count is odd.
pub fn cluster_growth_rate<'a>(values: impl Iterator<Item = &'a str>) -> f64 {
    let mut timestamps: Vec<i64> = values.filter_map(parse_timestamp).collect();
    if timestamps.len() < 2 {
        return 1.0;
    }

    timestamps.sort_unstable();
    let mid = timestamps.len() / 2;
    let older = mid;
    let recent = timestamps.len() - mid;

    if older > 0 {
        recent as f64 / older as f64
    } else {
        1.0
    }
}

/// Lenient timestamp parsing: RFC 3339, then the date/datetime layouts
/// adverse-event exports commonly use.
fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }
    for layout in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, layout) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
        }
    }

    None
}
