// Unit tests for the cluster summarizer.
//
// Verifies the narrative templates verbatim for fixed inputs, the
// threshold comparator directions at their boundaries, top-event
// extraction order, and the summary count bounds.

use vigil::dataset::{Dataset, LabeledDataset};
use vigil::signal::summary::{summarize_clusters, top_adverse_events};
use vigil::signal::ClusterStats;

fn labeled_with_events(events: &[(&str, i32)]) -> LabeledDataset {
    LabeledDataset {
        dataset: Dataset {
            columns: vec!["Adverse_Event".to_string()],
            rows: events.iter().map(|(e, _)| vec![e.to_string()]).collect(),
        },
        labels: events.iter().map(|(_, l)| *l).collect(),
        truncated_labels: 0,
    }
}

fn stats(cluster: i32, frequency: u64, severity: f64, growth_rate: f64) -> ClusterStats {
    ClusterStats {
        cluster,
        frequency,
        severity,
        growth_rate,
        signal_score: frequency as f64 * severity * growth_rate,
    }
}

// ============================================================
// Count bounds
// ============================================================

#[test]
fn returns_at_most_top_n() {
    let labeled = labeled_with_events(&[("nausea", 0), ("rash", 1), ("headache", 2)]);
    let table = vec![stats(0, 1, 1.0, 1.0), stats(1, 1, 1.0, 1.0), stats(2, 1, 1.0, 1.0)];

    assert_eq!(summarize_clusters(&table, &labeled, 2).len(), 2);
}

#[test]
fn returns_at_most_available_clusters() {
    let labeled = labeled_with_events(&[("nausea", 0), ("rash", 0)]);
    let table = vec![stats(0, 2, 1.0, 1.0)];

    assert_eq!(summarize_clusters(&table, &labeled, 5).len(), 1);
}

#[test]
fn summaries_preserve_ranked_order() {
    let labeled = labeled_with_events(&[("a", 0), ("a", 0), ("a", 0), ("b", 1)]);
    let table = vec![stats(0, 3, 1.0, 1.0), stats(1, 1, 1.0, 1.0)];

    let summaries = summarize_clusters(&table, &labeled, 5);
    assert_eq!(summaries[0].cluster, 0);
    assert_eq!(summaries[1].cluster, 1);
}

// ============================================================
// Top adverse events
// ============================================================

#[test]
fn top_events_capped_at_five() {
    let events: Vec<(&str, i32)> = vec![
        ("a", 0),
        ("b", 0),
        ("c", 0),
        ("d", 0),
        ("e", 0),
        ("f", 0),
        ("g", 0),
    ];
    let labeled = labeled_with_events(&events);
    assert_eq!(top_adverse_events(&labeled, 0, 0).len(), 5);
}

#[test]
fn top_events_sorted_by_count_then_first_seen() {
    let events: Vec<(&str, i32)> = vec![
        ("rash", 0),
        ("nausea", 0),
        ("nausea", 0),
        ("headache", 0),
        // rash and headache tie at 1 — rash was seen first
    ];
    let labeled = labeled_with_events(&events);
    let top = top_adverse_events(&labeled, 0, 0);
    assert_eq!(top, vec!["nausea", "rash", "headache"]);
}

#[test]
fn top_events_scoped_to_the_cluster() {
    let events: Vec<(&str, i32)> = vec![("nausea", 0), ("rash", 1), ("rash", 1)];
    let labeled = labeled_with_events(&events);
    assert_eq!(top_adverse_events(&labeled, 0, 0), vec!["nausea"]);
    assert_eq!(top_adverse_events(&labeled, 1, 0), vec!["rash"]);
}

// ============================================================
// Narrative text — exact templates
// ============================================================

#[test]
fn full_narrative_for_a_quiet_cluster() {
    let labeled = labeled_with_events(&[("nausea", 4), ("nausea", 4), ("vomiting", 4)]);
    let table = vec![stats(4, 3, 1.0, 1.0)];

    let summaries = summarize_clusters(&table, &labeled, 5);
    assert_eq!(
        summaries[0].summary,
        "Cluster 4 represents a safety signal with 3 reported adverse events. \
         While the severity levels are relatively lower, the frequency of reports warrants attention. \
         The reporting frequency has remained relatively stable over time. \
         The most commonly reported adverse events in this cluster include: nausea, vomiting. \
         While the signal score is lower, continued surveillance is recommended to detect any emerging patterns."
    );
}

#[test]
fn severity_two_selects_the_elevated_branch() {
    let labeled = labeled_with_events(&[("a", 0)]);
    let table = vec![stats(0, 4, 2.0, 1.0)];

    let text = &summarize_clusters(&table, &labeled, 1)[0].summary;
    assert!(text.contains(
        "This cluster shows elevated severity levels, indicating that the adverse events are generally serious in nature."
    ));
}

#[test]
fn growth_exactly_one_point_five_is_modest_not_concerning() {
    let labeled = labeled_with_events(&[("a", 0)]);
    let table = vec![stats(0, 2, 1.0, 1.5)];

    let text = &summarize_clusters(&table, &labeled, 1)[0].summary;
    assert!(text.contains("modest increase in reporting frequency (1.5x)"));
    assert!(!text.contains("concerning upward trend"));
}

#[test]
fn high_score_selects_priority_recommendation() {
    let labeled = labeled_with_events(&[("a", 0)]);
    let table = vec![stats(0, 60, 1.0, 1.0)];

    let text = &summarize_clusters(&table, &labeled, 1)[0].summary;
    assert!(text.contains(
        "Given the high signal score, this cluster requires priority investigation and may necessitate regulatory action or product labeling updates."
    ));
}

#[test]
fn no_adverse_event_column_omits_the_events_sentence() {
    let labeled = LabeledDataset {
        dataset: Dataset {
            columns: vec!["drug".to_string()],
            rows: vec![vec!["aspirin".to_string()]],
        },
        labels: vec![0],
        truncated_labels: 0,
    };
    let table = vec![stats(0, 1, 1.0, 1.0)];

    let summaries = summarize_clusters(&table, &labeled, 1);
    assert!(summaries[0].top_adverse_events.is_empty());
    assert!(!summaries[0].summary.contains("most commonly reported"));
}
