// Processing pipeline: load, embed, cluster, score, summarize.
//
// One run is a blocking unit of work over the whole dataset. Every stage
// consumes the previous stage's typed output in-process; the persisted
// artifacts (cluster labels, ranked signals, metrics) are written only
// when their producing stage succeeds, so a failed run leaves the
// previous run's artifacts untouched. Callers serialize runs — no two
// may execute concurrently against the same artifact store.

use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::cluster;
use crate::config::Config;
use crate::embedding::{self, traits::TextEmbedder};
use crate::metrics;
use crate::signal::summary::{self, DEFAULT_TOP_N};
use crate::signal::{engine, ClusterStats, ClusterSummary};
use crate::store::ArtifactStore;

/// How many texts go through the embedder per batch.
const EMBED_BATCH_SIZE: usize = 128;

/// What a completed pipeline run produced.
pub struct PipelineOutcome {
    pub summaries: Vec<ClusterSummary>,
    pub stats: Vec<ClusterStats>,
    pub rows: usize,
    pub n_clusters: usize,
    pub n_noise: usize,
}

/// Run the full pipeline over a delimited input file.
///
/// The input is staged into the artifact store as the canonical dataset,
/// then each stage runs in order: Loader → Embedder → Clusterer → Signal
/// Engine → Summarizer. Returns the top-5 summaries along with the full
/// ranked statistics.
pub async fn run(
    config: &Config,
    store: &ArtifactStore,
    embedder: &dyn TextEmbedder,
    input: &Path,
) -> Result<PipelineOutcome> {
    // Stage the upload as the canonical dataset
    let dataset_path = store.dataset_path();
    if input != dataset_path {
        store.ensure_dir()?;
        std::fs::copy(input, &dataset_path).with_context(|| {
            format!(
                "Failed to stage {} as {}",
                input.display(),
                dataset_path.display()
            )
        })?;
    }

    // Step 1: load and clean
    let dataset = store.load_dataset()?;
    if dataset.is_empty() {
        anyhow::bail!("Dataset contains no complete rows after cleaning");
    }
    let rows = dataset.len();
    println!("Loaded {rows} cleaned reports");

    // Step 2: embed the report text
    let text_idx = embedding::select_text_column(&dataset)?;
    let texts: Vec<String> = dataset.rows.iter().map(|row| row[text_idx].clone()).collect();

    println!("Generating embeddings for {} texts...", texts.len());
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Embedding [{bar:30}] {pos}/{len} ({eta})")
            .expect("valid template"),
    );

    let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
    for batch in texts.chunks(EMBED_BATCH_SIZE) {
        let batch_embeddings = embedder
            .embed_batch(batch)
            .await
            .context("Embedding stage failed")?;
        pb.inc(batch_embeddings.len() as u64);
        embeddings.extend(batch_embeddings);
    }
    pb.finish_and_clear();

    // Step 3: cluster (CPU-bound, off the async runtime)
    println!("Clustering embeddings...");
    let method = config.cluster_method;
    let kmeans_k = config.kmeans_k;
    let (embeddings, labels) = tokio::task::spawn_blocking(move || {
        cluster::cluster_embeddings(&embeddings, method, kmeans_k)
            .map(|labels| (embeddings, labels))
    })
    .await
    .context("spawn_blocking panicked")?
    .context("Clustering stage failed")?;

    store.save_labels(&labels)?;
    metrics::merge_update(
        &store.metrics_path(),
        metrics::clustering_metrics(&embeddings, &labels),
    )?;

    // Step 4: signal detection (re-reads the persisted artifacts so a
    // standalone `vigil signals` run goes down the identical path)
    let (stats, labeled) = engine::detect_signals(store).context("Signal detection failed")?;

    let mut signal_fields = metrics::signal_metrics(&stats, labeled.truncated_labels);
    if let Some(classification) = metrics::classification_metrics(&labeled) {
        info!("Found 'label' column, recording classification metrics");
        signal_fields.extend(classification);
    }
    metrics::merge_update(&store.metrics_path(), signal_fields)?;

    // Step 5: summaries for the top clusters
    let summaries = summary::summarize_clusters(&stats, &labeled, DEFAULT_TOP_N);

    let n_clusters = stats.len();
    let n_noise = labeled
        .labels
        .iter()
        .filter(|&&l| l == cluster::NOISE_LABEL)
        .count();

    info!(rows, n_clusters, n_noise, "Pipeline run complete");

    Ok(PipelineOutcome {
        summaries,
        stats,
        rows,
        n_clusters,
        n_noise,
    })
}
