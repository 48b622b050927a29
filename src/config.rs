use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::cluster::ClusterMethod;

/// Central configuration loaded from environment variables.
///
/// All paths are explicit and threaded through the pipeline stages —
/// nothing reads from the process working directory. The .env file is
/// loaded automatically at startup via dotenvy.
pub struct Config {
    /// Directory holding the uploaded dataset and all derived artifacts
    /// (cluster labels, ranked signals, metrics document).
    pub data_dir: PathBuf,
    /// Directory containing the ONNX embedding model files
    pub model_dir: PathBuf,
    /// Which clustering method to use (default: HDBSCAN)
    pub cluster_method: ClusterMethod,
    /// Cluster count for K-means (ignored by HDBSCAN)
    pub kmeans_k: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default — `vigil process data.csv` works out of
    /// the box once the embedding model has been downloaded.
    pub fn load() -> Result<Self> {
        let cluster_method = match env::var("VIGIL_CLUSTERER").as_deref() {
            Ok("kmeans") => ClusterMethod::Kmeans,
            // "hdbscan" or unset both default to HDBSCAN
            _ => ClusterMethod::Hdbscan,
        };

        let kmeans_k = env::var("VIGIL_KMEANS_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let model_dir = env::var("VIGIL_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        Ok(Self {
            data_dir: env::var("VIGIL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            model_dir,
            cluster_method,
            kmeans_k,
        })
    }

    /// Validate that the embedding model files exist.
    /// Call this before any operation that runs the pipeline.
    pub fn require_model(&self) -> Result<()> {
        if !crate::embedding::download::model_files_present(&self.model_dir) {
            anyhow::bail!(
                "Embedding model files not found in {}\n\
                 Run `vigil download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }
}
