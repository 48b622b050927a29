// Cluster summaries — deterministic natural-language narratives.
//
// Each summary is four sentence slots joined with single spaces: opening,
// severity assessment, growth assessment, an optional top-events sentence,
// and a closing recommendation. The slot thresholds are fixed constants;
// the same statistics always produce the same text.

use std::collections::HashMap;

use crate::dataset::LabeledDataset;

use super::columns::{self, ColumnRole};
use super::{ClusterStats, ClusterSummary};

/// How many top clusters to summarize by default.
pub const DEFAULT_TOP_N: usize = 5;

/// How many distinct adverse events to keep per cluster.
const MAX_TOP_EVENTS: usize = 5;

/// How many events are named in the summary sentence before the rest are
/// folded into "and N other event type(s)".
const NAMED_EVENTS: usize = 3;

/// Summarize the top `top_n` clusters from ranked statistics.
///
/// Returns at most `top_n` entries in the statistics' (descending-score)
/// order. When no adverse-event column can be discovered, the event lists
/// are empty and the summaries omit the "most commonly reported" sentence.
pub fn summarize_clusters(
    stats: &[ClusterStats],
    labeled: &LabeledDataset,
    top_n: usize,
) -> Vec<ClusterSummary> {
    let ae_idx = columns::discover(&labeled.dataset.columns, ColumnRole::AdverseEvent);

    stats
        .iter()
        .take(top_n)
        .map(|cluster_stats| {
            let top_adverse_events = ae_idx
                .map(|idx| top_adverse_events(labeled, cluster_stats.cluster, idx))
                .unwrap_or_default();

            let summary = compose_summary(cluster_stats, &top_adverse_events);

            ClusterSummary {
                cluster: cluster_stats.cluster,
                frequency: cluster_stats.frequency,
                severity: cluster_stats.severity,
                growth_rate: cluster_stats.growth_rate,
                signal_score: cluster_stats.signal_score,
                top_adverse_events,
                summary,
            }
        })
        .collect()
}

/// The most frequent adverse-event values within a cluster, descending by
/// count. Ties keep the order in which values were first encountered.
pub fn top_adverse_events(labeled: &LabeledDataset, cluster: i32, ae_idx: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for row in labeled.cluster_rows(cluster) {
        let value = &row[ae_idx];
        if !counts.contains_key(value) {
            order.push(value.clone());
        }
        *counts.entry(value.clone()).or_insert(0) += 1;
    }

    // Stable sort keeps first-encountered order for equal counts
    order.sort_by_key(|value| std::cmp::Reverse(counts[value]));
    order.truncate(MAX_TOP_EVENTS);
    order
}

/// Compose the narrative for one cluster.
pub fn compose_summary(stats: &ClusterStats, top_events: &[String]) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(5);

    parts.push(format!(
        "Cluster {} represents a safety signal with {} reported adverse events.",
        stats.cluster, stats.frequency
    ));

    parts.push(severity_sentence(stats.severity).to_string());
    parts.push(growth_sentence(stats.growth_rate));

    if !top_events.is_empty() {
        parts.push(events_sentence(top_events));
    }

    parts.push(recommendation_sentence(stats.signal_score).to_string());

    parts.join(" ")
}

fn severity_sentence(severity: f64) -> &'static str {
    if severity >= 2.0 {
        "This cluster shows elevated severity levels, indicating that the adverse events \
         are generally serious in nature."
    } else if severity >= 1.5 {
        "The average severity in this cluster is moderate, suggesting a mix of serious \
         and non-serious events."
    } else {
        "While the severity levels are relatively lower, the frequency of reports \
         warrants attention."
    }
}

fn growth_sentence(growth_rate: f64) -> String {
    if growth_rate > 1.5 {
        format!(
            "The reporting rate for this cluster is {growth_rate:.1}x higher in recent \
             periods compared to earlier periods, indicating a concerning upward trend \
             that requires immediate monitoring."
        )
    } else if growth_rate > 1.0 {
        format!(
            "This cluster shows a modest increase in reporting frequency \
             ({growth_rate:.1}x), suggesting a potential emerging safety concern."
        )
    } else if growth_rate < 0.8 {
        format!(
            "While the reporting rate has decreased ({growth_rate:.1}x), the overall \
             frequency and severity still warrant continued surveillance."
        )
    } else {
        "The reporting frequency has remained relatively stable over time.".to_string()
    }
}

fn events_sentence(top_events: &[String]) -> String {
    let named: Vec<&str> = top_events
        .iter()
        .take(NAMED_EVENTS)
        .map(|e| e.as_str())
        .collect();
    let mut events_str = named.join(", ");
    if top_events.len() > NAMED_EVENTS {
        events_str.push_str(&format!(
            ", and {} other event type(s)",
            top_events.len() - NAMED_EVENTS
        ));
    }
    format!("The most commonly reported adverse events in this cluster include: {events_str}.")
}

fn recommendation_sentence(signal_score: f64) -> &'static str {
    if signal_score > 50.0 {
        "Given the high signal score, this cluster requires priority investigation and \
         may necessitate regulatory action or product labeling updates."
    } else if signal_score > 20.0 {
        "This cluster should be closely monitored, and additional analysis may be \
         needed to understand the underlying risk factors."
    } else {
        "While the signal score is lower, continued surveillance is recommended to \
         detect any emerging patterns."
    }
}
