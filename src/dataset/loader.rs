// Record loader — delimited-file ingest and cleaning.
//
// Handles the quirks real adverse-event exports show up with: unknown
// delimiters, a junk first line above the header, a compound `$`-joined
// key column, and ad-hoc ground-truth label column names. The output is
// a fully dense Dataset: any row with a missing cell is dropped.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::Dataset;

/// Compound key column produced by some FAERS-derived exports. Split on
/// `$` into its four parts before cleaning.
const COMPOUND_COLUMN: &str = "RXAUI$DRUG$Adverse_Event$count_of_reaction";
const COMPOUND_PARTS: [&str; 4] = ["RXAUI", "DRUG", "Adverse_Event", "count_of_reaction"];

/// Ground-truth column names recognized (compared lowercase). The first
/// match is renamed to `label` and coerced to integer 0/1.
const LABEL_CANDIDATES: [&str; 5] = ["label", "is_adr", "class", "target", "ground_truth"];

/// Delimiters considered when sniffing the header line.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Load and clean a delimited dataset from disk.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset from {}", path.display()))?;
    let dataset = parse_dataset(&content)?;
    info!(
        rows = dataset.len(),
        columns = dataset.columns.len(),
        "Dataset loaded and cleaned"
    );
    Ok(dataset)
}

/// Parse and clean delimited content.
///
/// Tries a strict parse first; if that fails (e.g. a stray line above the
/// real header), retries once skipping the first line. The cleaning pass
/// then splits the compound key column, drops incomplete rows, and
/// normalizes the ground-truth label column.
pub fn parse_dataset(content: &str) -> Result<Dataset> {
    let (columns, rows) = match parse_strict(content) {
        Ok(parsed) => parsed,
        Err(first_err) => {
            warn!(error = %first_err, "Initial parse failed, retrying without first line");
            let rest = match content.split_once('\n') {
                Some((_, rest)) => rest,
                None => return Err(first_err),
            };
            parse_strict(rest).map_err(|_| first_err)?
        }
    };

    let raw_count = rows.len();
    let (columns, rows) = split_compound_column(columns, rows);

    // Drop any row with a missing cell
    let mut rows: Vec<Vec<String>> = rows
        .into_iter()
        .filter(|row| !row.iter().any(|cell| is_missing(cell)))
        .collect();

    if rows.len() < raw_count {
        info!(
            before = raw_count,
            after = rows.len(),
            "Dropped rows with missing values"
        );
    }

    let columns = normalize_label_column(columns, &mut rows);

    Ok(Dataset { columns, rows })
}

/// Strict CSV parse: sniffed delimiter, ragged rows are an error.
fn parse_strict(content: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = sniff_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to parse record")?;
        rows.push(record.iter().map(|c| c.trim().to_string()).collect());
    }

    Ok((columns, rows))
}

/// Pick the delimiter that occurs most often in the header line.
/// Ties and zero counts fall back to comma (first in candidate order).
fn sniff_delimiter(line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0usize;
    for &d in &DELIMITERS {
        let count = line.bytes().filter(|&b| b == d).count();
        if count > best_count {
            best = d;
            best_count = count;
        }
    }
    best
}

/// Split the compound `$`-joined key column into its four parts.
///
/// Rows whose value does not split into exactly four parts get empty
/// cells, which the missing-value pass then drops. The count part must be
/// numeric; non-numeric counts are treated as missing too.
fn split_compound_column(
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
) -> (Vec<String>, Vec<Vec<String>>) {
    let compound_idx = match columns.iter().position(|c| c == COMPOUND_COLUMN) {
        Some(idx) => idx,
        None => return (columns, rows),
    };

    info!("Splitting compound key column into {COMPOUND_PARTS:?}");

    let mut new_columns: Vec<String> = columns;
    new_columns.remove(compound_idx);
    new_columns.extend(COMPOUND_PARTS.iter().map(|p| p.to_string()));

    let new_rows = rows
        .into_iter()
        .map(|mut row| {
            let compound = if compound_idx < row.len() {
                row.remove(compound_idx)
            } else {
                String::new()
            };

            let parts: Vec<&str> = compound.split('$').collect();
            if parts.len() == 4 {
                row.extend(parts.iter().take(3).map(|p| p.trim().to_string()));
                // Coerce the reaction count to an integer; non-numeric → missing
                let count = parts[3].trim();
                match count.parse::<f64>() {
                    Ok(n) if n.is_finite() => row.push(format!("{}", n as i64)),
                    _ => row.push(String::new()),
                }
            } else {
                row.extend(std::iter::repeat(String::new()).take(4));
            }
            row
        })
        .collect();

    (new_columns, new_rows)
}

/// Rename the first recognized ground-truth column to `label` and coerce
/// its values to integers (non-numeric → 0).
fn normalize_label_column(mut columns: Vec<String>, rows: &mut [Vec<String>]) -> Vec<String> {
    let found = columns
        .iter()
        .position(|c| LABEL_CANDIDATES.contains(&c.to_lowercase().as_str()));

    let idx = match found {
        Some(idx) => idx,
        None => {
            info!("No ground-truth label column found (checked: {LABEL_CANDIDATES:?})");
            return columns;
        }
    };

    info!(column = %columns[idx], "Found ground-truth label column, renaming to 'label'");
    columns[idx] = "label".to_string();

    for row in rows.iter_mut() {
        if let Some(cell) = row.get_mut(idx) {
            let coerced = cell
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v as i64)
                .unwrap_or(0);
            *cell = coerced.to_string();
        }
    }

    columns
}

/// Whether a cell counts as missing. Mirrors the usual NA token set of
/// tabular readers, plus the empty string.
fn is_missing(cell: &str) -> bool {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return true;
    }
    matches!(
        trimmed.to_lowercase().as_str(),
        "na" | "n/a" | "#n/a" | "nan" | "null" | "none"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_parse_and_clean() {
        let content = "drug,reaction\naspirin,nausea\nibuprofen,headache\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(ds.columns, vec!["drug", "reaction"]);
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn rows_with_missing_cells_are_dropped() {
        let content = "drug,reaction\naspirin,\nibuprofen,headache\nwarfarin,NA\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.rows[0][0], "ibuprofen");
    }

    #[test]
    fn sniffs_semicolon_delimiter() {
        let content = "drug;reaction\naspirin;nausea\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(ds.columns, vec!["drug", "reaction"]);
        assert_eq!(ds.rows[0], vec!["aspirin", "nausea"]);
    }

    #[test]
    fn compound_column_is_split() {
        let content = "RXAUI$DRUG$Adverse_Event$count_of_reaction\n\
                       123$aspirin$nausea$4\n\
                       456$ibuprofen$rash$7\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(
            ds.columns,
            vec!["RXAUI", "DRUG", "Adverse_Event", "count_of_reaction"]
        );
        assert_eq!(ds.rows[0], vec!["123", "aspirin", "nausea", "4"]);
    }

    #[test]
    fn malformed_compound_rows_are_dropped() {
        let content = "RXAUI$DRUG$Adverse_Event$count_of_reaction\n\
                       123$aspirin$nausea$4\n\
                       busted-row-without-separators\n\
                       456$ibuprofen$rash$not-a-number\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn label_column_is_normalized() {
        let content = "reaction,is_adr\nnausea,1\nrash,0\nheadache,yes\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(ds.columns, vec!["reaction", "label"]);
        // Non-numeric labels coerce to 0
        assert_eq!(ds.rows[2][1], "0");
    }

    #[test]
    fn junk_first_line_is_skipped_on_retry() {
        let content = "labeled_data\ndrug,reaction,count\naspirin,nausea,3\n";
        let ds = parse_dataset(content).unwrap();
        assert_eq!(ds.columns, vec!["drug", "reaction", "count"]);
        assert_eq!(ds.len(), 1);
    }
}
