//! The default merge-everything preview.

use std::collections::{BTreeMap, HashSet};

use fmerge_types::{FrameId, FrameStack, MergeConflict, Severity, StrategyKind};
use serde::{Deserialize, Serialize};

/// Success penalties applied per conflict when estimating a merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub critical_penalty: f64,
    pub high_penalty: f64,
    pub medium_penalty: f64,
    pub low_penalty: f64,
    /// Lower bound on `estimated_success`; keeps the estimate above zero.
    pub success_floor: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            critical_penalty: 0.3,
            high_penalty: 0.2,
            medium_penalty: 0.1,
            low_penalty: 0.05,
            success_floor: 0.1,
        }
    }
}

impl PreviewConfig {
    pub fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical_penalty,
            Severity::High => self.high_penalty,
            Severity::Medium => self.medium_penalty,
            Severity::Low => self.low_penalty,
        }
    }

    /// `1 - sum(penalties)`, clamped to `[success_floor, 1]`.
    pub fn estimate(&self, conflicts: &[MergeConflict]) -> f64 {
        let penalty: f64 = conflicts.iter().map(|c| self.penalty(c.severity)).sum();
        (1.0 - penalty).clamp(self.success_floor, 1.0)
    }
}

/// What merging both stacks wholesale would produce.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergePreview {
    /// Union of both stacks' frame ids, stack 1's order first.
    pub merged_frames: Vec<FrameId>,
    pub kept_from_stack1: Vec<FrameId>,
    /// Frames only stack 2 contributes.
    pub kept_from_stack2: Vec<FrameId>,
    pub total_conflicts: usize,
    pub conflicts_by_severity: BTreeMap<Severity, usize>,
    /// In `(0, 1]`.
    pub estimated_success: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
}

impl MergePreview {
    /// Returns `true` if no conflict stands in the way of the merge.
    pub fn is_clean(&self) -> bool {
        self.total_conflicts == 0
    }
}

pub fn build_preview(
    stack1: &FrameStack,
    stack2: &FrameStack,
    conflicts: &[MergeConflict],
    strategy: Option<StrategyKind>,
    config: &PreviewConfig,
) -> MergePreview {
    let mut seen: HashSet<&FrameId> = HashSet::new();
    let kept_from_stack1: Vec<FrameId> = stack1
        .frames
        .iter()
        .filter(|f| seen.insert(&f.id))
        .map(|f| f.id.clone())
        .collect();
    let kept_from_stack2: Vec<FrameId> = stack2
        .frames
        .iter()
        .filter(|f| seen.insert(&f.id))
        .map(|f| f.id.clone())
        .collect();

    let mut conflicts_by_severity = BTreeMap::new();
    for conflict in conflicts {
        *conflicts_by_severity.entry(conflict.severity).or_insert(0) += 1;
    }

    MergePreview {
        merged_frames: kept_from_stack1
            .iter()
            .chain(&kept_from_stack2)
            .cloned()
            .collect(),
        kept_from_stack1,
        kept_from_stack2,
        total_conflicts: conflicts.len(),
        conflicts_by_severity,
        estimated_success: config.estimate(conflicts),
        strategy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fmerge_types::{ConflictType, Frame};

    fn stack(id: &str, frame_ids: &[&str]) -> FrameStack {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        FrameStack::new(id, at).with_frames(
            frame_ids
                .iter()
                .map(|fid| Frame::new(*fid, "task", *fid, at)),
        )
    }

    fn conflict(left: &str, severity: Severity) -> MergeConflict {
        MergeConflict::between_frames(
            ConflictType::ParallelSolution,
            left.into(),
            "x".into(),
            severity,
            "",
        )
    }

    #[test]
    fn union_without_duplicates() {
        let a = stack("a", &["s", "a1", "a2"]);
        let b = stack("b", &["s", "b1"]);
        let preview = build_preview(&a, &b, &[], Some(StrategyKind::KeepBoth), &PreviewConfig::default());

        let ids = |v: &[FrameId]| v.iter().map(|f| f.as_str().to_owned()).collect::<Vec<_>>();
        assert_eq!(ids(&preview.merged_frames), ["s", "a1", "a2", "b1"]);
        assert_eq!(ids(&preview.kept_from_stack1), ["s", "a1", "a2"]);
        assert_eq!(ids(&preview.kept_from_stack2), ["b1"]);
        assert_eq!(preview.estimated_success, 1.0);
        assert_eq!(preview.strategy, Some(StrategyKind::KeepBoth));
        assert!(preview.is_clean());
    }

    #[test]
    fn penalties_reduce_success() {
        let a = stack("a", &["a"]);
        let b = stack("b", &["b"]);
        let conflicts = [conflict("p", Severity::High), conflict("q", Severity::Low)];
        let preview = build_preview(&a, &b, &conflicts, None, &PreviewConfig::default());
        assert!((preview.estimated_success - 0.75).abs() < 1e-9);
        assert_eq!(preview.total_conflicts, 2);
        assert_eq!(preview.conflicts_by_severity[&Severity::High], 1);
    }

    #[test]
    fn success_never_reaches_zero() {
        let conflicts: Vec<_> = (0..10)
            .map(|i| conflict(&format!("c{i}"), Severity::Critical))
            .collect();
        let config = PreviewConfig::default();
        let estimate = config.estimate(&conflicts);
        assert_eq!(estimate, config.success_floor);
        assert!(estimate > 0.0);
    }
}
