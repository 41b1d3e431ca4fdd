use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{ConflictResolution, MergeConflict};
use crate::ids::{FrameId, StackId};
use crate::strategy::ResolutionStrategy;

/// Snapshot marker a caller can restore to if the merge is rolled back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackPoint {
    /// The stack the merge is applied onto.
    pub stack_id: StackId,
    /// Number of frames in that stack before the merge.
    pub frame_count: usize,
    /// The stack's modification time when the plan was computed.
    pub captured_at: DateTime<Utc>,
}

/// Delivery outcome of a merge notification, filled in by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub channel: String,
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The plan produced by a resolution attempt.
///
/// The merge core never persists this; it is handed back to the caller,
/// which applies it and may fill in `notifications`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_frame_id: Option<FrameId>,
    /// Frame ids the plan keeps, first stack's order first.
    #[serde(default)]
    pub merged_frames: Vec<FrameId>,
    /// Conflicts considered, with the resolution attached on success.
    #[serde(default)]
    pub conflicts: Vec<MergeConflict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<ConflictResolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollback_point: Option<RollbackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<Vec<NotificationOutcome>>,
    /// Why the attempt failed, when `success` is `false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MergeResult {
    /// A failed attempt. No resolution state is exposed.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            merged_frame_id: None,
            merged_frames: Vec::new(),
            conflicts: Vec::new(),
            resolution: None,
            rollback_point: None,
            notifications: None,
            error: Some(error.into()),
        }
    }

    /// The strategy that produced this result, if it succeeded.
    pub fn strategy(&self) -> Option<&ResolutionStrategy> {
        self.resolution.as_ref().map(|r| &r.strategy)
    }
}
