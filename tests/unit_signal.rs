// Unit tests for the signal engine.
//
// Exercises the pure core: label joining (with length reconciliation),
// per-cluster aggregation with column-discovery fallbacks, and the
// ranking invariants of the statistics table.

use vigil::dataset::{Dataset, LabeledDataset};
use vigil::signal::engine::{compute_cluster_stats, join_labels};

fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
    Dataset {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

fn labeled(columns: &[&str], rows: &[&[&str]], labels: Vec<i32>) -> LabeledDataset {
    join_labels(dataset(columns, rows), labels).unwrap()
}

// ============================================================
// The bare-dataset scenario: no severity or temporal columns
// ============================================================

#[test]
fn bare_dataset_defaults_and_ranking() {
    // 10 records, labels [0,0,0,1,1,-1,-1,-1,-1,0] -> two clusters
    let rows: Vec<Vec<&str>> = (0..10).map(|_| vec!["nausea"]).collect();
    let row_refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    let labeled = labeled(
        &["Adverse_Event"],
        &row_refs,
        vec![0, 0, 0, 1, 1, -1, -1, -1, -1, 0],
    );

    let stats = compute_cluster_stats(&labeled);

    assert_eq!(stats.len(), 2);

    assert_eq!(stats[0].cluster, 0);
    assert_eq!(stats[0].frequency, 4);
    assert_eq!(stats[0].severity, 1.0);
    assert_eq!(stats[0].growth_rate, 1.0);
    assert_eq!(stats[0].signal_score, 4.0);

    assert_eq!(stats[1].cluster, 1);
    assert_eq!(stats[1].frequency, 2);
    assert_eq!(stats[1].signal_score, 2.0);
}

#[test]
fn noise_cluster_never_appears() {
    let rows: Vec<Vec<&str>> = (0..6).map(|_| vec!["rash"]).collect();
    let row_refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    let labeled = labeled(&["reaction"], &row_refs, vec![-1, 0, -1, 0, -1, 1]);

    let stats = compute_cluster_stats(&labeled);
    assert!(stats.iter().all(|s| s.cluster != -1));
}

#[test]
fn score_is_exactly_the_product_of_its_factors() {
    let labeled = labeled(
        &["reaction", "severity", "date"],
        &[
            &["nausea", "2", "2024-01-01"],
            &["nausea", "3", "2024-02-01"],
            &["nausea", "1", "2024-03-01"],
            &["rash", "1", "2024-01-15"],
            &["rash", "2", "2024-04-01"],
        ],
        vec![0, 0, 0, 1, 1],
    );

    for entry in compute_cluster_stats(&labeled) {
        assert_eq!(
            entry.signal_score,
            entry.frequency as f64 * entry.severity * entry.growth_rate
        );
        assert!(entry.signal_score >= 0.0);
        assert!(entry.frequency >= 1);
    }
}

#[test]
fn table_is_sorted_descending_with_ascending_id_ties() {
    // Three clusters of sizes 5, 5, 2 — equal scores tie-break on id
    let mut labels = vec![2; 5];
    labels.extend(vec![0; 5]);
    labels.extend(vec![1; 2]);
    let rows: Vec<Vec<&str>> = (0..12).map(|_| vec!["x"]).collect();
    let row_refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    let labeled = labeled(&["reaction"], &row_refs, labels);

    let stats = compute_cluster_stats(&labeled);

    for pair in stats.windows(2) {
        assert!(pair[0].signal_score >= pair[1].signal_score);
    }
    // Clusters 0 and 2 both score 5.0; 0 must come first
    assert_eq!(stats[0].cluster, 0);
    assert_eq!(stats[1].cluster, 2);
    assert_eq!(stats[2].cluster, 1);
}

// ============================================================
// Severity aggregation
// ============================================================

#[test]
fn severity_is_mean_of_numeric_values() {
    let labeled = labeled(
        &["reaction", "seriousness"],
        &[&["a", "1"], &["b", "1"], &["c", "3"], &["d", "3"]],
        vec![0, 0, 0, 0],
    );

    let stats = compute_cluster_stats(&labeled);
    assert_eq!(stats[0].severity, 2.0);
    assert_eq!(stats[0].signal_score, 8.0);
}

#[test]
fn non_numeric_severity_values_are_excluded_from_the_mean() {
    let labeled = labeled(
        &["reaction", "severity"],
        &[&["a", "2"], &["b", "unknown"], &["c", "4"]],
        vec![0, 0, 0],
    );

    let stats = compute_cluster_stats(&labeled);
    assert_eq!(stats[0].severity, 3.0);
}

#[test]
fn fully_non_numeric_severity_column_defaults_to_one() {
    let labeled = labeled(
        &["reaction", "severity"],
        &[&["a", "mild"], &["b", "severe"]],
        vec![0, 0],
    );

    let stats = compute_cluster_stats(&labeled);
    assert_eq!(stats[0].severity, 1.0);
}

// ============================================================
// Growth rate
// ============================================================

#[test]
fn growth_rate_two_timestamps_is_one() {
    let labeled = labeled(
        &["reaction", "date"],
        &[&["a", "2024-01-01"], &["b", "2024-06-01"]],
        vec![0, 0],
    );

    let stats = compute_cluster_stats(&labeled);
    assert_eq!(stats[0].growth_rate, 1.0);
}

#[test]
fn growth_rate_single_valid_timestamp_defaults() {
    let labeled = labeled(
        &["reaction", "date"],
        &[&["a", "2024-01-01"], &["b", "not a date"]],
        vec![0, 0],
    );

    let stats = compute_cluster_stats(&labeled);
    assert_eq!(stats[0].growth_rate, 1.0);
}

#[test]
fn growth_rate_five_timestamps_is_one_point_five() {
    // mid = 2: older half 2, recent half 3 -> 1.5
    let labeled = labeled(
        &["reaction", "date"],
        &[
            &["a", "2024-01-01"],
            &["b", "2024-02-01"],
            &["c", "2024-03-01"],
            &["d", "2024-04-01"],
            &["e", "2024-05-01"],
        ],
        vec![0, 0, 0, 0, 0],
    );

    let stats = compute_cluster_stats(&labeled);
    assert!((stats[0].growth_rate - 1.5).abs() < 1e-12);
}

// ============================================================
// Length reconciliation
// ============================================================

#[test]
fn longer_label_vector_is_truncated() {
    // 12 labels against 10 rows: first 10 used, last 2 discarded
    let rows: Vec<Vec<&str>> = (0..10).map(|_| vec!["x"]).collect();
    let row_refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();
    let mut labels = vec![0; 10];
    labels.extend([7, 7]);

    let labeled = join_labels(dataset(&["reaction"], &row_refs), labels).unwrap();
    assert_eq!(labeled.labels.len(), 10);
    assert_eq!(labeled.truncated_labels, 2);

    // The discarded labels never form a cluster
    let stats = compute_cluster_stats(&labeled);
    assert!(stats.iter().all(|s| s.cluster != 7));
}

#[test]
fn shorter_label_vector_is_an_error() {
    let rows: Vec<Vec<&str>> = (0..5).map(|_| vec!["x"]).collect();
    let row_refs: Vec<&[&str]> = rows.iter().map(|r| r.as_slice()).collect();

    assert!(join_labels(dataset(&["reaction"], &row_refs), vec![0, 0]).is_err());
}
