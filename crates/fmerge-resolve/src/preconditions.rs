//! Precondition checks run before any resolution work.
//!
//! Each check declares which strategies it guards. The engine runs its
//! checks in order and stops at the first failure; nothing is detected or
//! computed for a request that fails here.

use fmerge_types::StrategyKind;

use crate::context::ResolutionContext;
use crate::error::{ResolveError, ResolveResult};

/// A single precondition in the engine's validation pipeline.
///
/// The trait is object-safe and `Send + Sync` so checks can be stored in a
/// `Vec<Box<dyn Precondition>>`.
pub trait Precondition: Send + Sync {
    /// Human-readable name of this check.
    fn name(&self) -> &str;

    /// Whether this check guards `strategy`.
    fn applies_to(&self, strategy: StrategyKind) -> bool;

    /// Validate the caller's context.
    fn check(&self, strategy: StrategyKind, context: &ResolutionContext) -> ResolveResult<()>;
}

/// `team_vote` needs at least one vote.
#[derive(Clone, Copy, Debug, Default)]
pub struct VotesPresent;

impl Precondition for VotesPresent {
    fn name(&self) -> &str {
        "votes_present"
    }

    fn applies_to(&self, strategy: StrategyKind) -> bool {
        strategy == StrategyKind::TeamVote
    }

    fn check(&self, _: StrategyKind, context: &ResolutionContext) -> ResolveResult<()> {
        require_votes(context)
    }
}

/// `senior_override` needs a senior or lead caller.
#[derive(Clone, Copy, Debug, Default)]
pub struct RoleCanOverride;

impl Precondition for RoleCanOverride {
    fn name(&self) -> &str {
        "role_can_override"
    }

    fn applies_to(&self, strategy: StrategyKind) -> bool {
        strategy == StrategyKind::SeniorOverride
    }

    fn check(&self, _: StrategyKind, context: &ResolutionContext) -> ResolveResult<()> {
        require_override_role(context)
    }
}

/// A supplied AI confidence must lie in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConfidenceInRange;

impl Precondition for ConfidenceInRange {
    fn name(&self) -> &str {
        "confidence_in_range"
    }

    fn applies_to(&self, strategy: StrategyKind) -> bool {
        matches!(strategy, StrategyKind::AiSuggest | StrategyKind::Hybrid)
    }

    fn check(&self, _: StrategyKind, context: &ResolutionContext) -> ResolveResult<()> {
        match context.ai_confidence {
            Some(c) => checked_confidence(c).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// The built-in checks: votes, role, confidence.
pub fn standard_preconditions() -> Vec<Box<dyn Precondition>> {
    vec![
        Box::new(VotesPresent),
        Box::new(RoleCanOverride),
        Box::new(ConfidenceInRange),
    ]
}

/// Run every applicable check in order, failing fast.
pub fn validate(
    checks: &[Box<dyn Precondition>],
    strategy: StrategyKind,
    context: &ResolutionContext,
) -> ResolveResult<()> {
    checks
        .iter()
        .filter(|c| c.applies_to(strategy))
        .try_for_each(|c| c.check(strategy, context))
}

pub(crate) fn require_votes(context: &ResolutionContext) -> ResolveResult<()> {
    if context.votes.is_empty() {
        Err(ResolveError::VotesRequired)
    } else {
        Ok(())
    }
}

pub(crate) fn require_override_role(context: &ResolutionContext) -> ResolveResult<()> {
    match &context.role {
        Some(role) if role.can_override() => Ok(()),
        _ => Err(ResolveError::InsufficientRole {
            role: context.role_label().to_string(),
        }),
    }
}

pub(crate) fn checked_confidence(confidence: f64) -> ResolveResult<f64> {
    if (0.0..=1.0).contains(&confidence) {
        Ok(confidence)
    } else {
        Err(ResolveError::InvalidConfidence(confidence))
    }
}
