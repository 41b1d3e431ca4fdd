use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::frame::{Event, Frame};
use crate::ids::{FrameId, StackId};

/// One branch's complete snapshot of frames and events at merge time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameStack {
    pub id: StackId,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub events: Vec<Event>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FrameStack {
    /// Create an empty stack created and modified at `at`.
    pub fn new(id: impl Into<StackId>, at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            frames: Vec::new(),
            events: Vec::new(),
            created_at: at,
            modified_at: at,
        }
    }

    pub fn with_frames(mut self, frames: impl IntoIterator<Item = Frame>) -> Self {
        self.frames.extend(frames);
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = Event>) -> Self {
        self.events.extend(events);
        self
    }

    /// Returns `true` if the stack holds neither frames nor events.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty() && self.events.is_empty()
    }

    /// Look up a frame by id.
    pub fn frame(&self, id: &FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| &f.id == id)
    }

    /// The set of frame ids in this stack.
    pub fn frame_ids(&self) -> HashSet<&FrameId> {
        self.frames.iter().map(|f| &f.id).collect()
    }

    /// Events recording decisions, in stack order.
    pub fn decisions(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| e.is_decision())
    }
}
