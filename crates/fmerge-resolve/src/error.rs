//! Error types for the resolution engine.

use fmerge_types::{StrategyKind, TypeError};

/// Why a resolution attempt was refused.
///
/// Every variant is a deterministic precondition failure: retrying with the
/// same inputs yields the same error.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ResolveError {
    /// `team_vote` was requested without any votes.
    #[error("team_vote requires at least one vote")]
    VotesRequired,

    /// `senior_override` was requested by a caller who may not override.
    #[error("senior_override requires role senior or lead, caller has role '{role}'")]
    InsufficientRole { role: String },

    /// A supplied AI confidence lies outside `[0, 1]`.
    #[error("ai confidence {0} is outside [0, 1]")]
    InvalidConfidence(f64),

    /// A precondition stage refused the request for its own reason.
    #[error("precondition '{check}' failed for {strategy}: {message}")]
    Precondition {
        check: String,
        strategy: StrategyKind,
        message: String,
    },

    /// A strategy produced an invalid record.
    #[error("invalid strategy record: {0}")]
    Strategy(#[from] TypeError),
}

impl ResolveError {
    pub fn precondition(
        check: impl Into<String>,
        strategy: StrategyKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Precondition {
            check: check.into(),
            strategy,
            message: message.into(),
        }
    }

    /// Returns `true` for failures caused by the caller's context rather
    /// than by the engine.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, Self::Strategy(_))
    }
}

/// Convenience alias for resolution results.
pub type ResolveResult<T> = Result<T, ResolveError>;
