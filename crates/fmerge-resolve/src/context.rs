//! Caller-supplied context for a resolution.
//!
//! The engine never looks anything up itself: the caller gathers the
//! invoking user's role, stored votes, and any AI assessment beforehand.

use fmerge_types::{Role, TeamVote, VoteChoice};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionContext {
    /// The user invoking the resolution.
    pub user_id: Option<String>,
    pub role: Option<Role>,
    /// Votes cast so far, for `team_vote`.
    pub votes: Vec<TeamVote>,
    /// Confidence of an external AI assessment, in `[0, 1]`.
    pub ai_confidence: Option<f64>,
    /// The side the caller prefers (override target, hybrid role signal).
    pub choice: Option<VoteChoice>,
    /// Rationale recorded on the strategy.
    pub reasoning: Option<String>,
    /// Free-text notes recorded on the resolution.
    pub notes: Option<String>,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<Role>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_votes(mut self, votes: impl IntoIterator<Item = TeamVote>) -> Self {
        self.votes.extend(votes);
        self
    }

    pub fn with_vote(mut self, vote: TeamVote) -> Self {
        self.votes.push(vote);
        self
    }

    pub fn with_ai_confidence(mut self, confidence: f64) -> Self {
        self.ai_confidence = Some(confidence);
        self
    }

    pub fn with_choice(mut self, choice: VoteChoice) -> Self {
        self.choice = Some(choice);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// The caller's role for messages; `none` when unset.
    pub fn role_label(&self) -> &str {
        self.role.as_ref().map_or("none", Role::as_str)
    }
}
