// In-memory tabular dataset — the unit of exchange between pipeline stages.
//
// Column names are not fixed: downstream stages discover the columns they
// need by candidate-name lookup (see signal::columns). Cells are kept as
// strings and coerced at the point of use, the same way the aggregation
// code treats individual coercion failures as missing values.

pub mod loader;

/// A cleaned tabular dataset. Every row has exactly `columns.len()` cells
/// and no missing values — incomplete rows are dropped at load time.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Index of a column by exact (case-sensitive) name.
    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A dataset joined with one cluster label per row.
///
/// Labels are attached by the signal engine after length reconciliation
/// and never mutated afterwards. Label -1 marks a noise point.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    pub dataset: Dataset,
    pub labels: Vec<i32>,
    /// Number of trailing labels discarded because the label artifact was
    /// longer than the dataset (0 when the lengths matched).
    pub truncated_labels: usize,
}

impl LabeledDataset {
    /// Iterate over the rows assigned to one cluster.
    pub fn cluster_rows(&self, cluster: i32) -> impl Iterator<Item = &Vec<String>> {
        self.dataset
            .rows
            .iter()
            .zip(self.labels.iter())
            .filter(move |(_, &label)| label == cluster)
            .map(|(row, _)| row)
    }

    /// Distinct non-noise cluster ids, ascending.
    pub fn distinct_clusters(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.labels.iter().copied().filter(|&l| l != -1).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
