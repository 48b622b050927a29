// Metrics recorder — clustering quality, signal statistics, and optional
// classification quality against a ground-truth label column.
//
// All metrics accumulate in a single JSON document via merge-update: each
// stage contributes its own keys without clobbering the others. The
// document is only created from scratch on first write (or when the
// existing file is not valid JSON).

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::dataset::LabeledDataset;
use crate::signal::ClusterStats;

/// Cap on points used for the silhouette computation (O(n^2) distances).
/// Points are subsampled deterministically with an even stride.
const SILHOUETTE_MAX_SAMPLES: usize = 2_000;

/// Merge fields into the metrics document at `path`.
pub fn merge_update(path: &Path, fields: Map<String, Value>) -> Result<()> {
    let mut document = if path.exists() {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<Map<String, Value>>(&content).ok())
            .unwrap_or_default()
    } else {
        Map::new()
    };

    for (key, value) in fields {
        document.insert(key, value);
    }

    let content = serde_json::to_string_pretty(&Value::Object(document))?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
    info!(path = %path.display(), "Metrics document updated");
    Ok(())
}

/// Load the metrics document, if present and valid.
pub fn load(path: &Path) -> Option<Map<String, Value>> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Clustering-quality metrics: cluster/noise counts plus silhouette and
/// Davies-Bouldin scores over the non-noise points. Quality scores are
/// null when fewer than 2 clusters were found.
pub fn clustering_metrics(embeddings: &[Vec<f32>], labels: &[i32]) -> Map<String, Value> {
    let n_noise = labels.iter().filter(|&&l| l == -1).count();
    let mut cluster_ids: Vec<i32> = labels.iter().copied().filter(|&l| l != -1).collect();
    cluster_ids.sort_unstable();
    cluster_ids.dedup();
    let n_clusters = cluster_ids.len();

    let noise_ratio = if labels.is_empty() {
        0.0
    } else {
        n_noise as f64 / labels.len() as f64
    };

    let mut fields = Map::new();
    fields.insert("n_clusters".to_string(), json!(n_clusters));
    fields.insert("n_noise".to_string(), json!(n_noise));
    fields.insert("noise_ratio".to_string(), json!(noise_ratio));

    if n_clusters > 1 {
        let (points, point_labels) = non_noise_points(embeddings, labels);
        fields.insert(
            "silhouette_score".to_string(),
            option_to_value(silhouette_score(&points, &point_labels)),
        );
        fields.insert(
            "davies_bouldin_score".to_string(),
            option_to_value(davies_bouldin_score(&points, &point_labels)),
        );
    } else {
        fields.insert("silhouette_score".to_string(), Value::Null);
        fields.insert("davies_bouldin_score".to_string(), Value::Null);
    }

    fields
}

/// Signal-stage metrics over the ranked statistics table.
pub fn signal_metrics(stats: &[ClusterStats], truncated_labels: usize) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("total_signals".to_string(), json!(stats.len()));

    let scores: Vec<f64> = stats.iter().map(|s| s.signal_score).collect();
    let mean = |values: &[f64]| {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    };

    let max_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    };
    let min_score = if scores.is_empty() {
        0.0
    } else {
        scores.iter().copied().fold(f64::INFINITY, f64::min)
    };

    fields.insert("mean_signal_score".to_string(), json!(mean(&scores)));
    fields.insert("max_signal_score".to_string(), json!(max_score));
    fields.insert("min_signal_score".to_string(), json!(min_score));
    fields.insert(
        "high_priority_signals".to_string(),
        json!(stats.iter().filter(|s| s.signal_score > 50.0).count()),
    );
    fields.insert(
        "avg_growth_rate".to_string(),
        json!(mean(&stats.iter().map(|s| s.growth_rate).collect::<Vec<_>>())),
    );
    fields.insert(
        "avg_severity".to_string(),
        json!(mean(&stats.iter().map(|s| s.severity).collect::<Vec<_>>())),
    );
    fields.insert("label_truncation".to_string(), json!(truncated_labels));

    fields
}

/// Classification-quality metrics, computed only when the dataset carries
/// a ground-truth `label` column. Each cluster predicts its majority label
/// (ties predict 0); accuracy/precision/recall/F1 are reported to 4
/// decimal places.
pub fn classification_metrics(labeled: &LabeledDataset) -> Option<Map<String, Value>> {
    let label_idx = labeled.dataset.col_index("label")?;

    let truth: Vec<i64> = labeled
        .dataset
        .rows
        .iter()
        .map(|row| row[label_idx].parse::<i64>().unwrap_or(0))
        .collect();

    // Majority vote per cluster, including the noise cluster
    let mut votes: std::collections::HashMap<i32, (usize, usize)> = std::collections::HashMap::new();
    for (&cluster, &label) in labeled.labels.iter().zip(truth.iter()) {
        let entry = votes.entry(cluster).or_insert((0, 0));
        if label == 1 {
            entry.0 += 1;
        } else {
            entry.1 += 1;
        }
    }
    let majority: std::collections::HashMap<i32, i64> = votes
        .into_iter()
        .map(|(cluster, (pos, neg))| (cluster, if pos > neg { 1 } else { 0 }))
        .collect();

    let mut tp = 0u64;
    let mut tn = 0u64;
    let mut fp = 0u64;
    let mut fn_ = 0u64;
    for (&cluster, &label) in labeled.labels.iter().zip(truth.iter()) {
        let predicted = majority.get(&cluster).copied().unwrap_or(0);
        match (predicted, label) {
            (1, 1) => tp += 1,
            (0, 0) => tn += 1,
            (1, _) => fp += 1,
            (0, _) => fn_ += 1,
            _ => {}
        }
    }

    let total = labeled.labels.len() as f64;
    let accuracy = if total > 0.0 {
        (tp + tn) as f64 / total
    } else {
        0.0
    };
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    let mut fields = Map::new();
    fields.insert("accuracy".to_string(), json!(round4(accuracy)));
    fields.insert("precision".to_string(), json!(round4(precision)));
    fields.insert("recall".to_string(), json!(round4(recall)));
    fields.insert("f1_score".to_string(), json!(round4(f1)));
    Some(fields)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn option_to_value(value: Option<f64>) -> Value {
    value.map(|v| json!(v)).unwrap_or(Value::Null)
}

fn non_noise_points(embeddings: &[Vec<f32>], labels: &[i32]) -> (Vec<Vec<f32>>, Vec<i32>) {
    embeddings
        .iter()
        .zip(labels.iter())
        .filter(|(_, &label)| label != -1)
        .map(|(point, &label)| (point.clone(), label))
        .unzip()
}

fn euclidean(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Mean silhouette coefficient over a deterministic even-stride subsample.
///
/// Points in singleton clusters (within the sample) score 0, matching the
/// usual convention. Returns None when the sample covers fewer than 2
/// clusters.
fn silhouette_score(points: &[Vec<f32>], labels: &[i32]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }

    let stride = points.len().div_ceil(SILHOUETTE_MAX_SAMPLES).max(1);
    let sample: Vec<usize> = (0..points.len()).step_by(stride).collect();

    let sample_labels: Vec<i32> = sample.iter().map(|&i| labels[i]).collect();
    let mut distinct = sample_labels.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 2 {
        return None;
    }

    let mut total = 0.0;
    for (si, &i) in sample.iter().enumerate() {
        let own = sample_labels[si];

        // Mean distance to each cluster in the sample
        let mut sums: std::collections::HashMap<i32, (f64, usize)> =
            std::collections::HashMap::new();
        for (sj, &j) in sample.iter().enumerate() {
            if si == sj {
                continue;
            }
            let entry = sums.entry(sample_labels[sj]).or_insert((0.0, 0));
            entry.0 += euclidean(&points[i], &points[j]);
            entry.1 += 1;
        }

        let a = match sums.get(&own) {
            Some(&(sum, count)) if count > 0 => sum / count as f64,
            // Singleton cluster in the sample
            _ => {
                continue;
            }
        };

        let b = sums
            .iter()
            .filter(|(&label, _)| label != own)
            .map(|(_, &(sum, count))| sum / count as f64)
            .fold(f64::INFINITY, f64::min);

        let denom = a.max(b);
        if denom > 0.0 {
            total += (b - a) / denom;
        }
    }

    Some(total / sample.len() as f64)
}

/// Davies-Bouldin index: mean over clusters of the worst ratio of
/// within-cluster scatter to between-centroid separation. Lower is better.
fn davies_bouldin_score(points: &[Vec<f32>], labels: &[i32]) -> Option<f64> {
    let mut clusters: Vec<i32> = labels.to_vec();
    clusters.sort_unstable();
    clusters.dedup();
    if clusters.len() < 2 || points.is_empty() {
        return None;
    }

    let dim = points[0].len();

    // Centroid and mean scatter per cluster
    let mut centroids: Vec<Vec<f64>> = Vec::with_capacity(clusters.len());
    let mut scatters: Vec<f64> = Vec::with_capacity(clusters.len());
    for &cluster in &clusters {
        let members: Vec<&Vec<f32>> = points
            .iter()
            .zip(labels.iter())
            .filter(|(_, &l)| l == cluster)
            .map(|(p, _)| p)
            .collect();

        let mut centroid = vec![0.0f64; dim];
        for member in &members {
            for (c, &v) in centroid.iter_mut().zip(member.iter()) {
                *c += v as f64;
            }
        }
        for c in &mut centroid {
            *c /= members.len() as f64;
        }

        let centroid_f32: Vec<f32> = centroid.iter().map(|&c| c as f32).collect();
        let scatter = members
            .iter()
            .map(|m| euclidean(m, &centroid_f32))
            .sum::<f64>()
            / members.len() as f64;

        centroids.push(centroid);
        scatters.push(scatter);
    }

    let centroid_distance = |a: &[f64], b: &[f64]| {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt()
    };

    let mut total = 0.0;
    for i in 0..clusters.len() {
        let mut worst = 0.0f64;
        for j in 0..clusters.len() {
            if i == j {
                continue;
            }
            let separation = centroid_distance(&centroids[i], &centroids[j]);
            if separation > 0.0 {
                worst = worst.max((scatters[i] + scatters[j]) / separation);
            }
        }
        total += worst;
    }

    Some(total / clusters.len() as f64)
}
