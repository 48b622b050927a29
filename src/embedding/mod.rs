// Sentence embedding of adverse-event text.
//
// The pipeline embeds one free-text field per report into a dense vector;
// the clusterer then groups reports by vector proximity. The embedder is
// behind a trait so tests can substitute a cheap deterministic one.

pub mod download;
pub mod onnx;
pub mod traits;

use anyhow::Result;
use tracing::{info, warn};

use crate::dataset::Dataset;

/// Preferred names for the free-text column, in order.
const TEXT_CANDIDATES: [&str; 5] = [
    "reaction",
    "adverse_event",
    "Adverse_Event",
    "event",
    "description",
];

/// Pick the column whose text gets embedded.
///
/// Prefers the known adverse-event text names; otherwise falls back to
/// the first column that is not fully numeric. A dataset with no textual
/// column at all cannot be embedded.
pub fn select_text_column(dataset: &Dataset) -> Result<usize> {
    for candidate in TEXT_CANDIDATES {
        if let Some(idx) = dataset.col_index(candidate) {
            info!(column = candidate, "Using column for embeddings");
            return Ok(idx);
        }
    }

    let fallback = (0..dataset.columns.len()).find(|&idx| {
        dataset
            .rows
            .iter()
            .any(|row| row[idx].trim().parse::<f64>().is_err())
    });

    match fallback {
        Some(idx) => {
            warn!(
                column = %dataset.columns[idx],
                "No adverse-event text column found, falling back to first non-numeric column"
            );
            Ok(idx)
        }
        None => anyhow::bail!("No suitable text column found for embedding generation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn prefers_reaction_column() {
        let ds = dataset(
            &["drug", "reaction"],
            &[&["aspirin", "nausea"], &["ibuprofen", "rash"]],
        );
        assert_eq!(select_text_column(&ds).unwrap(), 1);
    }

    #[test]
    fn falls_back_to_first_non_numeric() {
        let ds = dataset(&["count", "note"], &[&["3", "dizzy"], &["5", "faint"]]);
        assert_eq!(select_text_column(&ds).unwrap(), 1);
    }

    #[test]
    fn all_numeric_dataset_is_an_error() {
        let ds = dataset(&["a", "b"], &[&["1", "2"], &["3", "4"]]);
        assert!(select_text_column(&ds).is_err());
    }
}
