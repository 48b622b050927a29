// Artifact store — the persisted files shared between pipeline stages
// and the API layer.
//
// Three artifacts live under the data directory: the canonical cleaned
// dataset (reports.csv), the cluster-label artifact (clusters.json), and
// the ranked signals table (top_signals.csv). The metrics document
// (metrics.json) sits alongside them but is owned by the metrics module.
// Each run supersedes artifacts wholesale; there is no incremental update.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::dataset::{loader, Dataset};
use crate::signal::{ClusterStats, SignalError};

/// File names within the data directory.
const DATASET_FILE: &str = "reports.csv";
const CLUSTERS_FILE: &str = "clusters.json";
const SIGNALS_FILE: &str = "top_signals.csv";
const METRICS_FILE: &str = "metrics.json";

/// Handle on the artifact directory. All paths are derived from the
/// configured data directory — nothing consults the working directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Create the data directory if it does not exist yet.
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory {}", self.data_dir.display())
        })
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.data_dir.join(DATASET_FILE)
    }

    pub fn clusters_path(&self) -> PathBuf {
        self.data_dir.join(CLUSTERS_FILE)
    }

    pub fn signals_path(&self) -> PathBuf {
        self.data_dir.join(SIGNALS_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.data_dir.join(METRICS_FILE)
    }

    /// Load and clean the canonical dataset.
    pub fn load_dataset(&self) -> Result<Dataset, SignalError> {
        let path = self.dataset_path();
        if !path.exists() {
            return Err(SignalError::DatasetMissing);
        }
        loader::load_dataset(&path).map_err(SignalError::Other)
    }

    /// Persist the cluster-label artifact: one integer per dataset row,
    /// -1 for noise points.
    pub fn save_labels(&self, labels: &[i32]) -> Result<()> {
        self.ensure_dir()?;
        let path = self.clusters_path();
        let json = serde_json::to_string(labels)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write cluster labels to {}", path.display()))?;
        info!(count = labels.len(), path = %path.display(), "Cluster labels saved");
        Ok(())
    }

    /// Load the cluster-label artifact.
    pub fn load_labels(&self) -> Result<Vec<i32>, SignalError> {
        let path = self.clusters_path();
        if !path.exists() {
            return Err(SignalError::ClusterDataMissing);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cluster labels from {}", path.display()))
            .map_err(SignalError::Other)?;
        let labels = serde_json::from_str(&content)
            .context("Cluster label artifact is not a JSON array of integers")
            .map_err(SignalError::Other)?;
        Ok(labels)
    }

    /// Persist the ranked signals table, superseding any prior version.
    pub fn save_signals(&self, stats: &[ClusterStats]) -> Result<()> {
        self.ensure_dir()?;
        let path = self.signals_path();
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to open {} for writing", path.display()))?;
        for entry in stats {
            writer.serialize(entry)?;
        }
        writer.flush()?;
        info!(signals = stats.len(), path = %path.display(), "Ranked signals table saved");
        Ok(())
    }

    /// Load the persisted ranked signals table, if one exists.
    pub fn load_signals(&self) -> Result<Option<Vec<ClusterStats>>> {
        let path = self.signals_path();
        if !path.exists() {
            return Ok(None);
        }
        let mut reader = csv::Reader::from_path(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut stats = Vec::new();
        for record in reader.deserialize() {
            stats.push(record.context("Malformed row in signals table")?);
        }
        Ok(Some(stats))
    }

    /// Delete every persisted artifact. Returns the file names that were
    /// actually removed.
    pub fn reset(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for path in [
            self.dataset_path(),
            self.clusters_path(),
            self.signals_path(),
            self.metrics_path(),
        ] {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to delete {}", path.display()))?;
                deleted.push(file_name(&path));
            }
        }
        info!(?deleted, "Artifacts reset");
        Ok(deleted)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let labels = vec![0, 0, 1, -1, 2];
        store.save_labels(&labels).unwrap();
        assert_eq!(store.load_labels().unwrap(), labels);
    }

    #[test]
    fn missing_labels_is_cluster_data_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_labels(),
            Err(SignalError::ClusterDataMissing)
        ));
    }

    #[test]
    fn missing_dataset_is_dataset_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_dataset(),
            Err(SignalError::DatasetMissing)
        ));
    }

    #[test]
    fn signals_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let stats = vec![
            ClusterStats {
                cluster: 2,
                frequency: 8,
                severity: 1.5,
                growth_rate: 2.0,
                signal_score: 24.0,
            },
            ClusterStats {
                cluster: 0,
                frequency: 3,
                severity: 1.0,
                growth_rate: 1.0,
                signal_score: 3.0,
            },
        ];
        store.save_signals(&stats).unwrap();

        let loaded = store.load_signals().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].cluster, 2);
        assert!((loaded[0].signal_score - 24.0).abs() < 1e-9);
    }

    #[test]
    fn reset_reports_deleted_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        store.save_labels(&[0, 1]).unwrap();
        let deleted = store.reset().unwrap();
        assert_eq!(deleted, vec!["clusters.json".to_string()]);
        assert!(!store.clusters_path().exists());
    }
}
