//! Aggregate counts over a detection run.

use std::collections::BTreeMap;

use fmerge_types::{ConflictType, MergeConflict, Severity};
use serde::{Deserialize, Serialize};

/// Conflict counts by severity and type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictSummary {
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<ConflictType, usize>,
    /// The highest severity seen, if any conflicts were found.
    pub highest: Option<Severity>,
}

impl ConflictSummary {
    pub fn from_conflicts(conflicts: &[MergeConflict]) -> Self {
        let mut summary = Self::default();
        for conflict in conflicts {
            summary.total += 1;
            *summary.by_severity.entry(conflict.severity).or_default() += 1;
            *summary.by_type.entry(conflict.conflict_type).or_default() += 1;
            summary.highest = summary.highest.max(Some(conflict.severity));
        }
        summary
    }

    /// Number of conflicts at exactly `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    /// Returns `true` when a human should look before merging
    /// (anything high or critical).
    pub fn requires_review(&self) -> bool {
        self.highest.is_some_and(|s| s >= Severity::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(kind: ConflictType, left: &str, severity: Severity) -> MergeConflict {
        MergeConflict::between_frames(kind, left.into(), "other".into(), severity, "test")
    }

    #[test]
    fn empty_summary() {
        let s = ConflictSummary::from_conflicts(&[]);
        assert_eq!(s.total, 0);
        assert_eq!(s.highest, None);
        assert!(!s.requires_review());
    }

    #[test]
    fn counts_and_highest() {
        let conflicts = vec![
            conflict(ConflictType::ParallelSolution, "a", Severity::Medium),
            conflict(ConflictType::ParallelSolution, "b", Severity::High),
            conflict(ConflictType::StructuralDivergence, "c", Severity::Low),
        ];
        let s = ConflictSummary::from_conflicts(&conflicts);
        assert_eq!(s.total, 3);
        assert_eq!(s.count(Severity::High), 1);
        assert_eq!(s.count(Severity::Critical), 0);
        assert_eq!(s.by_type[&ConflictType::ParallelSolution], 2);
        assert_eq!(s.highest, Some(Severity::High));
        assert!(s.requires_review());
    }
}
