use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TypeError;
use crate::ids::{EventId, FrameId};

/// Lifecycle state of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameState {
    /// Work is still in progress.
    Active,
    /// Work finished; outputs and digest are final.
    Closed,
}

impl FrameState {
    /// The wire tag for this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameState {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "closed" => Ok(Self::Closed),
            other => Err(TypeError::unknown_tag("frame state", other)),
        }
    }
}

/// A hierarchical unit of recorded agent work.
///
/// Frames are owned by the frame-management subsystem. The merge core only
/// ever reads them as immutable snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<FrameId>,
    /// Depth as recorded by the frame subsystem (0 for roots).
    #[serde(default)]
    pub depth: u32,
    #[serde(rename = "type")]
    pub frame_type: String,
    pub name: String,
    pub state: FrameState,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_text: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Frame {
    /// Create an active root frame with empty inputs and outputs.
    pub fn new(
        id: impl Into<FrameId>,
        frame_type: impl Into<String>,
        name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: None,
            depth: 0,
            frame_type: frame_type.into(),
            name: name.into(),
            state: FrameState::Active,
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            digest_text: None,
            created_at,
            closed_at: None,
        }
    }

    /// Attach this frame under `parent` at the given recorded depth.
    pub fn with_parent(mut self, parent: impl Into<FrameId>, depth: u32) -> Self {
        self.parent_id = Some(parent.into());
        self.depth = depth;
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(key.into(), value);
        self
    }

    pub fn with_output(mut self, key: impl Into<String>, value: Value) -> Self {
        self.outputs.insert(key.into(), value);
        self
    }

    pub fn with_digest(mut self, text: impl Into<String>) -> Self {
        self.digest_text = Some(text.into());
        self
    }

    /// Mark the frame closed at `at`.
    pub fn closed(mut self, at: DateTime<Utc>) -> Self {
        self.state = FrameState::Closed;
        self.closed_at = Some(at);
        self
    }

    /// Returns `true` if the frame has no parent.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.state == FrameState::Closed
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// Returns `true` if the frame carries non-blank digest text.
    pub fn has_digest(&self) -> bool {
        self.digest_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    /// Time between creation and close, if the frame is closed.
    pub fn lifetime(&self) -> Option<TimeDelta> {
        self.closed_at.map(|closed| closed - self.created_at)
    }
}

/// A typed, timestamped event recorded against a frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub frame_id: FrameId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub payload: BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        id: impl Into<EventId>,
        frame_id: impl Into<FrameId>,
        event_type: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            frame_id: frame_id.into(),
            event_type: event_type.into(),
            payload: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// A string-valued payload field, if present.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Returns `true` if this event records a decision.
    ///
    /// An event is a decision when its type is `decision`, when its payload
    /// carries `type: "decision"`, or when its payload has a `decision` field.
    pub fn is_decision(&self) -> bool {
        self.event_type == "decision"
            || self.payload_str("type") == Some("decision")
            || self.payload.contains_key("decision")
    }
}
