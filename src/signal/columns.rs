// Column discovery — role-to-candidate-name table.
//
// Adverse-event exports do not share a schema, so semantically relevant
// columns are found by trying an ordered list of known names per role.
// Matching is case-sensitive and exact; the first match wins. A role with
// no match disables the corresponding feature with a documented default
// (severity 1.0, growth rate 1.0, no top-events sentence).

/// The semantic roles the scoring core needs to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    /// Numeric seriousness indicator, averaged per cluster
    Severity,
    /// Timestamp column used for growth-rate estimation
    Temporal,
    /// Free-text adverse-event description, counted for summaries
    AdverseEvent,
}

/// Ordered candidate names for each role.
pub fn candidates(role: ColumnRole) -> &'static [&'static str] {
    match role {
        ColumnRole::Severity => &[
            "seriousness",
            "severity",
            "serious",
            "severity_score",
            "seriousness_score",
        ],
        ColumnRole::Temporal => &[
            "date",
            "time",
            "timestamp",
            "event_date",
            "report_date",
            "date_received",
        ],
        ColumnRole::AdverseEvent => &[
            "Adverse_Event",
            "adverse_event",
            "reaction",
            "adverse_reaction",
            "event",
        ],
    }
}

/// Find the index of the first candidate column present for a role.
pub fn discover(columns: &[String], role: ColumnRole) -> Option<usize> {
    candidates(role)
        .iter()
        .find_map(|name| columns.iter().position(|c| c == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn first_candidate_wins() {
        let columns = cols(&["severity", "seriousness", "date"]);
        // "seriousness" is earlier in the candidate list than "severity"
        assert_eq!(discover(&columns, ColumnRole::Severity), Some(1));
    }

    #[test]
    fn match_is_case_sensitive() {
        let columns = cols(&["Severity", "DATE"]);
        assert_eq!(discover(&columns, ColumnRole::Severity), None);
        assert_eq!(discover(&columns, ColumnRole::Temporal), None);
    }

    #[test]
    fn adverse_event_prefers_capitalized_form() {
        let columns = cols(&["reaction", "Adverse_Event"]);
        assert_eq!(discover(&columns, ColumnRole::AdverseEvent), Some(1));
    }

    #[test]
    fn no_match_returns_none() {
        let columns = cols(&["drug", "patient_id"]);
        assert_eq!(discover(&columns, ColumnRole::Severity), None);
        assert_eq!(discover(&columns, ColumnRole::Temporal), None);
        assert_eq!(discover(&columns, ColumnRole::AdverseEvent), None);
    }
}
