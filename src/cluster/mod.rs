// Clustering — groups embedding vectors into clusters of similar reports.
//
// HDBSCAN is the default: it finds the cluster count itself and labels
// unassignable points as noise (-1). A deterministic K-means is available
// for datasets where a fixed cluster count is preferred.

pub mod kmeans;

use anyhow::Result;
use tracing::{info, warn};

/// Reserved label for points not assigned to any cluster.
pub const NOISE_LABEL: i32 = -1;

/// HDBSCAN minimum cluster size (tuned for short adverse-event text).
const MIN_CLUSTER_SIZE: usize = 3;

/// Cap on how many embeddings are clustered in one run. Rows beyond the
/// cap are labeled as noise so downstream lengths still line up.
pub const MAX_CLUSTER_SAMPLES: usize = 50_000;

/// Which clustering backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMethod {
    /// Density-based, determines cluster count automatically (default)
    Hdbscan,
    /// Centroid-based with a fixed cluster count, deterministic seeding
    Kmeans,
}

/// Cluster embeddings into integer labels, one per input row.
///
/// The output is always the same length as the input: rows past the
/// sample cap get the noise label. An empty input is an error — it means
/// the upstream embedding stage produced nothing.
pub fn cluster_embeddings(
    embeddings: &[Vec<f32>],
    method: ClusterMethod,
    kmeans_k: usize,
) -> Result<Vec<i32>> {
    if embeddings.is_empty() {
        anyhow::bail!("No embeddings to cluster — the dataset produced no usable text");
    }

    let capped = embeddings.len().min(MAX_CLUSTER_SAMPLES);
    if capped < embeddings.len() {
        info!(
            total = embeddings.len(),
            sampled = capped,
            "Clustering the first {capped} embeddings, labeling the rest as noise"
        );
    }
    let sample: Vec<Vec<f32>> = embeddings[..capped].to_vec();

    let mut labels = match method {
        ClusterMethod::Hdbscan => run_hdbscan(&sample),
        ClusterMethod::Kmeans => run_kmeans(&sample, kmeans_k),
    };

    labels.resize(embeddings.len(), NOISE_LABEL);

    let n_clusters = {
        let mut ids: Vec<i32> = labels.iter().copied().filter(|&l| l != NOISE_LABEL).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    };
    let n_noise = labels.iter().filter(|&&l| l == NOISE_LABEL).count();
    info!(n_clusters, n_noise, "Clustering complete");

    Ok(labels)
}

fn run_hdbscan(sample: &[Vec<f32>]) -> Vec<i32> {
    if sample.len() < MIN_CLUSTER_SIZE {
        return vec![NOISE_LABEL; sample.len()];
    }

    let data = sample.to_vec();
    let hyper_params = hdbscan::HdbscanHyperParams::builder()
        .min_cluster_size(MIN_CLUSTER_SIZE)
        .min_samples(1)
        .build();

    let clusterer = hdbscan::Hdbscan::new(&data, hyper_params);
    match clusterer.cluster() {
        Ok(labels) => labels,
        Err(e) => {
            // Treat a clusterer failure as "everything is noise" rather
            // than aborting the run
            warn!(error = ?e, "HDBSCAN failed, labeling all points as noise");
            vec![NOISE_LABEL; sample.len()]
        }
    }
}

fn run_kmeans(sample: &[Vec<f32>], k: usize) -> Vec<i32> {
    let k = k.clamp(1, sample.len());
    let result = kmeans::KMeans::new(sample, k, 100);
    result
        .assignments
        .into_iter()
        .map(|label| label as i32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_an_error() {
        assert!(cluster_embeddings(&[], ClusterMethod::Hdbscan, 10).is_err());
    }

    #[test]
    fn tiny_input_is_all_noise_under_hdbscan() {
        let embeddings = vec![vec![0.0f32, 1.0], vec![1.0, 0.0]];
        let labels = cluster_embeddings(&embeddings, ClusterMethod::Hdbscan, 10).unwrap();
        assert_eq!(labels, vec![NOISE_LABEL, NOISE_LABEL]);
    }

    #[test]
    fn kmeans_labels_every_point() {
        let embeddings = vec![
            vec![0.0f32, 0.0],
            vec![0.1, 0.0],
            vec![10.0, 10.0],
            vec![10.1, 10.0],
        ];
        let labels = cluster_embeddings(&embeddings, ClusterMethod::Kmeans, 2).unwrap();
        assert_eq!(labels.len(), 4);
        assert!(labels.iter().all(|&l| l >= 0));
        // The two tight pairs end up in the same cluster
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn output_length_matches_input_length() {
        let embeddings = vec![vec![0.0f32; 4]; 7];
        let labels = cluster_embeddings(&embeddings, ClusterMethod::Kmeans, 3).unwrap();
        assert_eq!(labels.len(), 7);
    }
}
