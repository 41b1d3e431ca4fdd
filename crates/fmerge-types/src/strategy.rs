use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The policy used to decide between (or combine) conflicting branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Lossless union of both branches.
    KeepBoth,
    /// Majority of recorded team votes.
    TeamVote,
    /// A senior or lead picks the outcome.
    SeniorOverride,
    /// An AI suggestion, trusted at the supplied confidence.
    AiSuggest,
    /// Solution quality, role weighting, and AI confidence combined.
    Hybrid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        Self::KeepBoth,
        Self::TeamVote,
        Self::SeniorOverride,
        Self::AiSuggest,
        Self::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepBoth => "keep_both",
            Self::TeamVote => "team_vote",
            Self::SeniorOverride => "senior_override",
            Self::AiSuggest => "ai_suggest",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep_both" => Ok(Self::KeepBoth),
            "team_vote" => Ok(Self::TeamVote),
            "senior_override" => Ok(Self::SeniorOverride),
            "ai_suggest" => Ok(Self::AiSuggest),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(TypeError::unknown_tag("strategy", other)),
        }
    }
}

/// Which branch a vote (or a strategy) favors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Frame1,
    Frame2,
    Both,
    Neither,
}

impl VoteChoice {
    pub const ALL: [VoteChoice; 4] = [Self::Frame1, Self::Frame2, Self::Both, Self::Neither];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frame1 => "frame1",
            Self::Frame2 => "frame2",
            Self::Both => "both",
            Self::Neither => "neither",
        }
    }

    /// Whether frames from the first stack survive this choice.
    pub fn keeps_first(&self) -> bool {
        matches!(self, Self::Frame1 | Self::Both)
    }

    /// Whether frames from the second stack survive this choice.
    pub fn keeps_second(&self) -> bool {
        matches!(self, Self::Frame2 | Self::Both)
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteChoice {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frame1" => Ok(Self::Frame1),
            "frame2" => Ok(Self::Frame2),
            "both" => Ok(Self::Both),
            "neither" => Ok(Self::Neither),
            other => Err(TypeError::unknown_tag("vote choice", other)),
        }
    }
}

/// A single team member's vote on a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamVote {
    pub voter_id: String,
    pub choice: VoteChoice,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl TeamVote {
    pub fn new(voter_id: impl Into<String>, choice: VoteChoice, timestamp: DateTime<Utc>) -> Self {
        Self {
            voter_id: voter_id.into(),
            choice,
            timestamp,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Team role of the caller requesting a resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Junior,
    Member,
    Senior,
    Lead,
    /// Any role the merge core has no special rules for.
    Other(String),
}

impl Role {
    /// Roles allowed to override a merge outright.
    pub fn can_override(&self) -> bool {
        matches!(self, Self::Senior | Self::Lead)
    }

    /// Weight this role's preference carries in a hybrid resolution.
    pub fn weight(&self) -> f64 {
        match self {
            Self::Lead => 1.0,
            Self::Senior => 0.9,
            Self::Member => 0.6,
            Self::Junior => 0.4,
            Self::Other(_) => 0.5,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Junior => "junior",
            Self::Member => "member",
            Self::Senior => "senior",
            Self::Lead => "lead",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "junior" => Self::Junior,
            "member" => Self::Member,
            "senior" => Self::Senior,
            "lead" => Self::Lead,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

/// The strategy record attached to a resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStrategy {
    #[serde(rename = "type")]
    pub kind: StrategyKind,
    /// Confidence in the outcome, in `[0, 1]`.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<TeamVote>>,
}

impl ResolutionStrategy {
    /// Create a strategy record; fails if `confidence` is outside `[0, 1]`.
    pub fn new(kind: StrategyKind, confidence: f64) -> Result<Self, TypeError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(TypeError::ConfidenceOutOfRange(confidence.to_string()));
        }
        Ok(Self {
            kind,
            confidence,
            reasoning: None,
            votes: None,
        })
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn with_votes(mut self, votes: Vec<TeamVote>) -> Self {
        self.votes = Some(votes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_tags_parse() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
        }
        let err = "coin_flip".parse::<StrategyKind>().unwrap_err();
        assert!(err.to_string().contains("coin_flip"));
    }

    #[test]
    fn vote_choice_keeps() {
        assert!(VoteChoice::Both.keeps_first() && VoteChoice::Both.keeps_second());
        assert!(VoteChoice::Frame1.keeps_first() && !VoteChoice::Frame1.keeps_second());
        assert!(!VoteChoice::Neither.keeps_first() && !VoteChoice::Neither.keeps_second());
    }

    #[test]
    fn role_override_rights() {
        assert!(Role::Senior.can_override());
        assert!(Role::Lead.can_override());
        assert!(!Role::Junior.can_override());
        assert!(!Role::from("architect").can_override());
    }

    #[test]
    fn role_serde_uses_plain_strings() {
        let json = serde_json::to_string(&Role::Lead).unwrap();
        assert_eq!(json, "\"lead\"");
        let parsed: Role = serde_json::from_str("\"intern\"").unwrap();
        assert_eq!(parsed, Role::Other("intern".into()));
    }

    #[test]
    fn confidence_is_range_checked() {
        assert!(ResolutionStrategy::new(StrategyKind::AiSuggest, 0.7).is_ok());
        assert!(ResolutionStrategy::new(StrategyKind::AiSuggest, 1.2).is_err());
        assert!(ResolutionStrategy::new(StrategyKind::AiSuggest, f64::NAN).is_err());
    }

    #[test]
    fn strategy_serializes_type_tag() {
        let strategy = ResolutionStrategy::new(StrategyKind::TeamVote, 0.5).unwrap();
        let value = serde_json::to_value(&strategy).unwrap();
        assert_eq!(value["type"], "team_vote");
    }
}
