//! Conflict markers: one badge per implicated frame.
//!
//! Colors and symbols are a fixed presentation contract. Front ends key
//! their legends off these literals, so they never change per call.

use fmerge_types::{ConflictId, ConflictType, FrameId, MergeConflict, Severity};
use serde::Serialize;

/// Marker color for a severity.
pub const fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "#D32F2F",
        Severity::High => "#FF5722",
        Severity::Medium => "#FFA726",
        Severity::Low => "#FFEB3B",
    }
}

/// Marker glyph for a conflict type.
pub const fn conflict_symbol(kind: ConflictType) -> &'static str {
    match kind {
        ConflictType::ParallelSolution => "⚡",
        ConflictType::ConflictingDecision => "⚠",
        ConflictType::StructuralDivergence => "🔀",
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Conflict,
}

/// A badge drawn on one frame of a conflict.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConflictMarker {
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub conflict_id: ConflictId,
    pub frame_id: FrameId,
    /// The other frame of the pair.
    pub counterpart: FrameId,
    pub conflict_type: ConflictType,
    pub severity: Severity,
    pub color: &'static str,
    pub symbol: &'static str,
    pub tooltip: String,
}

/// Exactly two markers per conflict, `frame1`'s first.
pub fn render_conflict_markers(conflicts: &[MergeConflict]) -> Vec<ConflictMarker> {
    conflicts
        .iter()
        .flat_map(|c| {
            [
                marker(c, &c.frame1, &c.frame2),
                marker(c, &c.frame2, &c.frame1),
            ]
        })
        .collect()
}

fn marker(conflict: &MergeConflict, frame: &FrameId, counterpart: &FrameId) -> ConflictMarker {
    ConflictMarker {
        kind: MarkerKind::Conflict,
        conflict_id: conflict.id,
        frame_id: frame.clone(),
        counterpart: counterpart.clone(),
        conflict_type: conflict.conflict_type,
        severity: conflict.severity,
        color: severity_color(conflict.severity),
        symbol: conflict_symbol(conflict.conflict_type),
        tooltip: format!(
            "[{}] {}: {}",
            conflict.severity, conflict.conflict_type, conflict.description
        ),
    }
}
