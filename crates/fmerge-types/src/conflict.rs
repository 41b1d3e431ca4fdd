use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{ConflictId, EventId, FrameId};
use crate::strategy::ResolutionStrategy;

/// Kind of divergence between two frame stacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Both branches solved the same problem independently.
    ParallelSolution,
    /// Both branches recorded incompatible decisions.
    ConflictingDecision,
    /// Both branches restructured the same subtree differently.
    StructuralDivergence,
}

impl ConflictType {
    /// The wire tag for this conflict type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParallelSolution => "parallel_solution",
            Self::ConflictingDecision => "conflicting_decision",
            Self::StructuralDivergence => "structural_divergence",
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel_solution" => Ok(Self::ParallelSolution),
            "conflicting_decision" => Ok(Self::ConflictingDecision),
            "structural_divergence" => Ok(Self::StructuralDivergence),
            other => Err(TypeError::unknown_tag("conflict type", other)),
        }
    }
}

/// How damaging an unresolved conflict is.
///
/// Ordering: `Low < Medium < High < Critical` (total order, used both for
/// ranking detection output and for display coloring).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Severity of a structural divergence rooted at the given tree depth.
    ///
    /// Shallower divergences affect more of the tree and rank higher.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => Self::Critical,
            1 => Self::High,
            2 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(TypeError::unknown_tag("severity", other)),
        }
    }
}

/// The record of how a conflict (or a whole stack pair) was resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    pub strategy: ResolutionStrategy,
    /// User id, `ai_system`, `team`, or `system`.
    pub resolved_by: String,
    pub resolved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_frame_id: Option<FrameId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A detected, typed, severity-ranked disagreement between two frame stacks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeConflict {
    pub id: ConflictId,
    #[serde(rename = "type")]
    pub conflict_type: ConflictType,
    /// Implicated frame from the first stack.
    pub frame1: FrameId,
    /// Implicated frame from the second stack.
    pub frame2: FrameId,
    /// Implicated events, for decision conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event1: Option<EventId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event2: Option<EventId>,
    pub severity: Severity,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ConflictResolution>,
}

impl MergeConflict {
    /// Create a conflict between two frames; the id is derived from the
    /// type and the frame ids.
    pub fn between_frames(
        conflict_type: ConflictType,
        frame1: FrameId,
        frame2: FrameId,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ConflictId::derive(conflict_type, frame1.as_str(), frame2.as_str()),
            conflict_type,
            frame1,
            frame2,
            event1: None,
            event2: None,
            severity,
            description: description.into(),
            detected_at: Utc::now(),
            conflicting_paths: None,
            resolution: None,
        }
    }

    /// Create a conflict between two events; the id is derived from the
    /// event ids, the frame fields carry the events' owning frames.
    pub fn between_events(
        conflict_type: ConflictType,
        (event1, frame1): (EventId, FrameId),
        (event2, frame2): (EventId, FrameId),
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: ConflictId::derive(conflict_type, event1.as_str(), event2.as_str()),
            conflict_type,
            frame1,
            frame2,
            event1: Some(event1),
            event2: Some(event2),
            severity,
            description: description.into(),
            detected_at: Utc::now(),
            conflicting_paths: None,
            resolution: None,
        }
    }

    pub fn with_paths(mut self, paths: Vec<String>) -> Self {
        self.conflicting_paths = Some(paths);
        self
    }

    /// Returns `true` if `frame` is one of the two implicated frames.
    pub fn implicates(&self, frame: &FrameId) -> bool {
        &self.frame1 == frame || &self.frame2 == frame
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}
