//! Blast-radius severity classification shared by the REST `impact`
//! sub-resource and the MCP `analyze_impact` tool, so the two surfaces
//! can never disagree about how a change ranks.

use crate::enums::{ChangeType, EdgeType, Severity};

/// Lower is more severe, so a threshold filter is `rank(severity) <= rank(threshold)`.
pub fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Critical => 0,
        Severity::High => 1,
        Severity::Medium => 2,
        Severity::Low => 3,
    }
}

/// depth 1 + delete + {writes_to, reads_from, calls} -> critical;
/// depth 1 otherwise + {calls, transforms_to} -> high, else medium;
/// depth 2 -> medium; depth >= 3 -> low.
pub fn classify_severity(depth: u32, change_type: ChangeType, edge_type: EdgeType) -> Severity {
    if depth == 1 {
        if change_type == ChangeType::Delete
            && matches!(edge_type, EdgeType::WritesTo | EdgeType::ReadsFrom | EdgeType::Calls)
        {
            return Severity::Critical;
        }
        return if matches!(edge_type, EdgeType::Calls | EdgeType::TransformsTo) {
            Severity::High
        } else {
            Severity::Medium
        };
    }
    if depth == 2 {
        return Severity::Medium;
    }
    Severity::Low
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_delete_of_a_write_dependency_is_critical() {
        let severity = classify_severity(1, ChangeType::Delete, EdgeType::WritesTo);
        assert_eq!(severity, Severity::Critical);
    }

    #[test]
    fn direct_rename_of_a_call_site_is_high() {
        let severity = classify_severity(1, ChangeType::Rename, EdgeType::Calls);
        assert_eq!(severity, Severity::High);
    }

    #[test]
    fn depth_two_is_always_medium() {
        assert_eq!(classify_severity(2, ChangeType::Delete, EdgeType::Calls), Severity::Medium);
    }

    #[test]
    fn depth_three_or_more_is_low() {
        assert_eq!(classify_severity(4, ChangeType::Delete, EdgeType::WritesTo), Severity::Low);
    }

    #[test]
    fn rank_orders_critical_as_most_severe() {
        assert!(severity_rank(Severity::Critical) < severity_rank(Severity::Low));
    }
}
