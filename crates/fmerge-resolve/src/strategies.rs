//! The five resolution strategies and their dispatch table.
//!
//! Each strategy is a pure function of a [`StrategyInput`]: the two stacks,
//! the conflicts detected between them, the caller's context, and a clock
//! reading. None of them touch the stacks; they only decide which side wins
//! and how sure they are.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use fmerge_detect::{effectiveness_score, DetectionConfig};
use fmerge_types::{
    ConflictResolution, ConflictType, Frame, FrameId, FrameStack, MergeConflict, ResolutionStrategy,
    StrategyKind, VoteChoice,
};

use crate::config::ResolutionConfig;
use crate::context::ResolutionContext;
use crate::error::ResolveResult;
use crate::preconditions::{checked_confidence, require_override_role, require_votes};

const AI_RESOLVER: &str = "ai_system";
const SYSTEM_RESOLVER: &str = "system";
const TEAM_RESOLVER: &str = "team";
const HYBRID_RESOLVER: &str = "hybrid";
const UNKNOWN_USER: &str = "unknown_user";

/// Scale applied to the mean signal strength when hybrid signals disagree.
const HYBRID_DISAGREEMENT_SCALE: f64 = 0.8;
/// Strength assumed for a role signal from a caller with no role.
const UNKNOWN_ROLE_WEIGHT: f64 = 0.5;

/// Everything a strategy may look at.
#[derive(Clone, Copy, Debug)]
pub struct StrategyInput<'a> {
    pub stack1: &'a FrameStack,
    pub stack2: &'a FrameStack,
    /// Detected conflicts, highest severity first.
    pub conflicts: &'a [MergeConflict],
    pub context: &'a ResolutionContext,
    pub config: &'a ResolutionConfig,
    pub detection: &'a DetectionConfig,
    pub now: DateTime<Utc>,
}

/// What a strategy decided.
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyOutcome {
    pub resolution: ConflictResolution,
    /// Which side's conflicting frames survive.
    pub choice: VoteChoice,
}

/// A strategy implementation.
pub type StrategyFn = fn(&StrategyInput<'_>) -> ResolveResult<StrategyOutcome>;

/// The dispatch table: every strategy tag maps to exactly one function.
pub fn strategy_for(kind: StrategyKind) -> StrategyFn {
    match kind {
        StrategyKind::KeepBoth => keep_both,
        StrategyKind::TeamVote => team_vote,
        StrategyKind::SeniorOverride => senior_override,
        StrategyKind::AiSuggest => ai_suggest,
        StrategyKind::Hybrid => hybrid,
    }
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Keep every frame of both stacks.
pub fn keep_both(input: &StrategyInput<'_>) -> ResolveResult<StrategyOutcome> {
    let strategy = ResolutionStrategy::new(StrategyKind::KeepBoth, 1.0)?
        .with_reasoning(input.context.reasoning.clone().unwrap_or_else(|| {
            format!(
                "kept every frame from {} and {}",
                input.stack1.id, input.stack2.id
            )
        }));
    Ok(outcome(input, strategy, SYSTEM_RESOLVER, VoteChoice::Both))
}

/// Majority of the supplied votes; confidence is the winner's share.
///
/// An evenly split vote keeps both sides.
pub fn team_vote(input: &StrategyInput<'_>) -> ResolveResult<StrategyOutcome> {
    require_votes(input.context)?;
    let votes = &input.context.votes;

    let mut tally: BTreeMap<VoteChoice, usize> = BTreeMap::new();
    for vote in votes {
        *tally.entry(vote.choice).or_default() += 1;
    }
    let top = tally.values().copied().max().unwrap_or(0);
    let leaders: Vec<VoteChoice> = tally
        .iter()
        .filter(|(_, count)| **count == top)
        .map(|(choice, _)| *choice)
        .collect();

    let confidence = top as f64 / votes.len() as f64;
    let breakdown = tally
        .iter()
        .map(|(choice, count)| format!("{choice} {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    let (choice, reasoning) = match leaders.as_slice() {
        [winner] => (
            *winner,
            format!("{} votes ({breakdown}); {winner} wins", votes.len()),
        ),
        _ => (
            VoteChoice::Both,
            format!("{} votes ({breakdown}); tie, keeping both", votes.len()),
        ),
    };

    let strategy = ResolutionStrategy::new(StrategyKind::TeamVote, confidence)?
        .with_reasoning(reasoning)
        .with_votes(votes.clone());
    Ok(outcome(input, strategy, TEAM_RESOLVER, choice))
}

/// A senior or lead picks the side outright.
pub fn senior_override(input: &StrategyInput<'_>) -> ResolveResult<StrategyOutcome> {
    require_override_role(input.context)?;
    let ctx = input.context;
    let user = ctx.user_id.as_deref().unwrap_or(UNKNOWN_USER);
    let choice = ctx.choice.unwrap_or(VoteChoice::Frame1);

    let reasoning = ctx.reasoning.clone().unwrap_or_else(|| {
        format!("{} override by {user}: kept {choice}", ctx.role_label())
    });
    let strategy = ResolutionStrategy::new(
        StrategyKind::SeniorOverride,
        input.config.senior_override_confidence,
    )?
    .with_reasoning(reasoning);
    Ok(outcome(input, strategy, user, choice))
}

/// Trust an external AI assessment; pick the more finished solution.
pub fn ai_suggest(input: &StrategyInput<'_>) -> ResolveResult<StrategyOutcome> {
    let confidence = checked_confidence(
        input
            .context
            .ai_confidence
            .unwrap_or(input.config.default_ai_confidence),
    )?;
    let (choice, e1, e2) = solution_side(input);

    let reasoning = input.context.reasoning.clone().unwrap_or_else(|| {
        format!("effectiveness {e1:.2} vs {e2:.2}; suggest {choice}")
    });
    let strategy = ResolutionStrategy::new(StrategyKind::AiSuggest, confidence)?
        .with_reasoning(reasoning);
    Ok(outcome(input, strategy, AI_RESOLVER, choice))
}

/// Weigh solution quality, the caller's role preference, and AI confidence.
///
/// When every signal that expresses a preference points the same way the
/// confidence is at least `hybrid_agreement_floor`; otherwise it is scaled
/// down and the side with more total weight wins.
pub fn hybrid(input: &StrategyInput<'_>) -> ResolveResult<StrategyOutcome> {
    let ctx = input.context;
    let ai = ctx.ai_confidence.map(checked_confidence).transpose()?;
    let (solution, e1, e2) = solution_side(input);

    let mut signals: Vec<(Option<VoteChoice>, f64)> = Vec::new();
    let solution_pick = side_of(solution);
    signals.push((solution_pick, e1.max(e2)));
    if let Some(choice) = ctx.choice {
        let weight = ctx.role.as_ref().map_or(UNKNOWN_ROLE_WEIGHT, |r| r.weight());
        signals.push((side_of(choice), weight));
    }
    if let Some(ai) = ai {
        signals.push((solution_pick, ai));
    }

    let strengths: Vec<f64> = signals.iter().map(|(_, s)| *s).collect();
    let mean = strengths.iter().sum::<f64>() / strengths.len() as f64;

    let mut weight1 = 0.0;
    let mut weight2 = 0.0;
    for (side, strength) in &signals {
        match side {
            Some(VoteChoice::Frame1) => weight1 += strength,
            Some(VoteChoice::Frame2) => weight2 += strength,
            _ => {}
        }
    }
    let agree = (weight1 > 0.0) != (weight2 > 0.0);
    let choice = if weight1 > weight2 {
        VoteChoice::Frame1
    } else if weight2 > weight1 {
        VoteChoice::Frame2
    } else {
        VoteChoice::Both
    };

    let floor = input.config.hybrid_agreement_floor;
    let confidence = if agree {
        floor + (1.0 - floor) * mean
    } else {
        HYBRID_DISAGREEMENT_SCALE * mean
    }
    .min(1.0);

    let reasoning = ctx.reasoning.clone().unwrap_or_else(|| {
        format!(
            "effectiveness {e1:.2} vs {e2:.2}, role {}, ai {}; signals {}",
            ctx.role_label(),
            ai.map_or_else(|| "none".to_string(), |c| format!("{c:.2}")),
            if agree { "agree" } else { "split" }
        )
    });
    let strategy =
        ResolutionStrategy::new(StrategyKind::Hybrid, confidence)?.with_reasoning(reasoning);
    Ok(outcome(input, strategy, HYBRID_RESOLVER, choice))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// The two frames the decision is about.
///
/// The pair behind the most severe parallel solution, else behind the most
/// severe conflicting decision, else each stack's first root. Structural
/// divergences name a shared parent on both sides and never pick a side.
pub fn primary_frames<'a>(input: &StrategyInput<'a>) -> (Option<&'a Frame>, Option<&'a Frame>) {
    let subject = input
        .conflicts
        .iter()
        .find(|c| c.conflict_type == ConflictType::ParallelSolution)
        .or_else(|| {
            input
                .conflicts
                .iter()
                .find(|c| c.conflict_type != ConflictType::StructuralDivergence)
        });
    match subject {
        Some(conflict) => (
            input
                .stack1
                .frame(&conflict.frame1)
                .or_else(|| first_root(input.stack1)),
            input
                .stack2
                .frame(&conflict.frame2)
                .or_else(|| first_root(input.stack2)),
        ),
        None => (first_root(input.stack1), first_root(input.stack2)),
    }
}

fn first_root(stack: &FrameStack) -> Option<&Frame> {
    stack
        .frames
        .iter()
        .find(|f| f.is_root())
        .or_else(|| stack.frames.first())
}

/// Which side's primary frame looks more finished, with both scores.
fn solution_side(input: &StrategyInput<'_>) -> (VoteChoice, f64, f64) {
    let (f1, f2) = primary_frames(input);
    let score = |f: Option<&Frame>| f.map_or(0.0, |f| effectiveness_score(f, input.detection));
    let (e1, e2) = (score(f1), score(f2));
    let choice = if e1 > e2 {
        VoteChoice::Frame1
    } else if e2 > e1 {
        VoteChoice::Frame2
    } else {
        VoteChoice::Both
    };
    (choice, e1, e2)
}

fn side_of(choice: VoteChoice) -> Option<VoteChoice> {
    match choice {
        VoteChoice::Frame1 | VoteChoice::Frame2 => Some(choice),
        VoteChoice::Both | VoteChoice::Neither => None,
    }
}

fn winning_frame(input: &StrategyInput<'_>, choice: VoteChoice) -> Option<FrameId> {
    let (f1, f2) = primary_frames(input);
    match choice {
        VoteChoice::Frame1 => f1.map(|f| f.id.clone()),
        VoteChoice::Frame2 => f2.map(|f| f.id.clone()),
        VoteChoice::Both | VoteChoice::Neither => None,
    }
}

fn outcome(
    input: &StrategyInput<'_>,
    strategy: ResolutionStrategy,
    resolved_by: &str,
    choice: VoteChoice,
) -> StrategyOutcome {
    StrategyOutcome {
        resolution: ConflictResolution {
            strategy,
            resolved_by: resolved_by.to_string(),
            resolved_at: input.now,
            merged_frame_id: winning_frame(input, choice),
            notes: input.context.notes.clone(),
        },
        choice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fmerge_detect::ConflictDetector;
    use fmerge_types::{Role, TeamVote};
    use serde_json::json;

    use crate::error::ResolveError;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    /// Stack 1 finished its solution; stack 2 is still working.
    fn stacks() -> (FrameStack, FrameStack) {
        let a = FrameStack::new("a", at(0)).with_frames([Frame::new("fa", "task", "Fix Authentication Bug", at(0))
            .with_output("solution", json!("Refactored entire auth system"))
            .closed(at(120))]);
        let b = FrameStack::new("b", at(0)).with_frames([Frame::new("fb", "task", "Fix Authentication Bug", at(0))
            .with_output("solution", json!("Applied minimal patch"))]);
        (a, b)
    }

    struct Fixture {
        a: FrameStack,
        b: FrameStack,
        conflicts: Vec<MergeConflict>,
        config: ResolutionConfig,
        detection: DetectionConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let (a, b) = stacks();
            let conflicts = ConflictDetector::new().detect(&a, &b);
            Self {
                a,
                b,
                conflicts,
                config: ResolutionConfig::default(),
                detection: DetectionConfig::default(),
            }
        }

        fn run(&self, kind: StrategyKind, ctx: &ResolutionContext) -> ResolveResult<StrategyOutcome> {
            let input = StrategyInput {
                stack1: &self.a,
                stack2: &self.b,
                conflicts: &self.conflicts,
                context: ctx,
                config: &self.config,
                detection: &self.detection,
                now: at(500),
            };
            strategy_for(kind)(&input)
        }
    }

    fn vote(voter: &str, choice: VoteChoice) -> TeamVote {
        TeamVote::new(voter, choice, at(10))
    }

    #[test]
    fn dispatch_echoes_kind() {
        let fx = Fixture::new();
        let ctx = ResolutionContext::for_user("lead-1")
            .with_role(Role::Lead)
            .with_vote(vote("v", VoteChoice::Frame2));
        for kind in StrategyKind::ALL {
            let out = fx.run(kind, &ctx).unwrap();
            assert_eq!(out.resolution.strategy.kind, kind);
            assert_eq!(out.resolution.resolved_at, at(500));
        }
    }

    #[test]
    fn keep_both_is_certain() {
        let out = Fixture::new().run(StrategyKind::KeepBoth, &ResolutionContext::new()).unwrap();
        assert_eq!(out.resolution.strategy.confidence, 1.0);
        assert_eq!(out.choice, VoteChoice::Both);
        assert_eq!(out.resolution.resolved_by, "system");
        assert_eq!(out.resolution.merged_frame_id, None);
    }

    #[test]
    fn team_vote_majority() {
        let ctx = ResolutionContext::new().with_votes([
            vote("a", VoteChoice::Frame1),
            vote("b", VoteChoice::Frame1),
            vote("c", VoteChoice::Frame2),
        ]);
        let out = Fixture::new().run(StrategyKind::TeamVote, &ctx).unwrap();
        let strategy = &out.resolution.strategy;
        assert!((strategy.confidence - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(strategy.votes.as_ref().unwrap(), &ctx.votes);
        assert_eq!(out.choice, VoteChoice::Frame1);
        assert_eq!(out.resolution.merged_frame_id.as_ref().map(FrameId::as_str), Some("fa"));
    }

    #[test]
    fn team_vote_tie_keeps_both() {
        let ctx = ResolutionContext::new()
            .with_votes([vote("a", VoteChoice::Frame1), vote("b", VoteChoice::Frame2)]);
        let out = Fixture::new().run(StrategyKind::TeamVote, &ctx).unwrap();
        assert_eq!(out.choice, VoteChoice::Both);
        assert_eq!(out.resolution.strategy.kind, StrategyKind::TeamVote);
        assert_eq!(out.resolution.strategy.confidence, 0.5);
        assert!(out.resolution.strategy.reasoning.as_deref().unwrap().contains("tie"));
    }

    #[test]
    fn team_vote_requires_votes_even_when_called_directly() {
        let result = Fixture::new().run(StrategyKind::TeamVote, &ResolutionContext::new());
        assert_eq!(result.unwrap_err(), ResolveError::VotesRequired);
    }

    #[test]
    fn senior_override_records_user() {
        let ctx = ResolutionContext::for_user("alice")
            .with_role(Role::Senior)
            .with_choice(VoteChoice::Frame2);
        let out = Fixture::new().run(StrategyKind::SeniorOverride, &ctx).unwrap();
        assert!(out.resolution.strategy.confidence > 0.9);
        assert_eq!(out.resolution.resolved_by, "alice");
        assert_eq!(out.choice, VoteChoice::Frame2);
        assert_eq!(out.resolution.merged_frame_id.as_ref().map(FrameId::as_str), Some("fb"));
        assert!(out.resolution.strategy.reasoning.as_deref().unwrap().contains("alice"));
    }

    #[test]
    fn senior_override_rejects_junior() {
        let ctx = ResolutionContext::for_user("bob").with_role(Role::Junior);
        let err = Fixture::new().run(StrategyKind::SeniorOverride, &ctx).unwrap_err();
        assert!(matches!(err, ResolveError::InsufficientRole { .. }));
    }

    #[test]
    fn ai_suggest_prefers_finished_solution() {
        let ctx = ResolutionContext::new().with_ai_confidence(0.72);
        let out = Fixture::new().run(StrategyKind::AiSuggest, &ctx).unwrap();
        assert_eq!(out.resolution.resolved_by, "ai_system");
        assert_eq!(out.resolution.strategy.confidence, 0.72);
        assert_eq!(out.choice, VoteChoice::Frame1);
    }

    #[test]
    fn ai_suggest_defaults_confidence() {
        let out = Fixture::new().run(StrategyKind::AiSuggest, &ResolutionContext::new()).unwrap();
        assert_eq!(out.resolution.strategy.confidence, 0.5);
    }

    #[test]
    fn hybrid_agreement_exceeds_floor() {
        let ctx = ResolutionContext::for_user("carol")
            .with_role(Role::Lead)
            .with_choice(VoteChoice::Frame1)
            .with_ai_confidence(0.9);
        let out = Fixture::new().run(StrategyKind::Hybrid, &ctx).unwrap();
        assert!(out.resolution.strategy.confidence > 0.85);
        assert!(out.resolution.strategy.confidence <= 1.0);
        assert_eq!(out.choice, VoteChoice::Frame1);
    }

    #[test]
    fn hybrid_split_signals_lower_confidence() {
        let ctx = ResolutionContext::for_user("dave")
            .with_role(Role::Junior)
            .with_choice(VoteChoice::Frame2)
            .with_ai_confidence(0.9);
        let out = Fixture::new().run(StrategyKind::Hybrid, &ctx).unwrap();
        assert!(out.resolution.strategy.confidence < 0.85);
        // Solution quality and AI outweigh a junior's preference.
        assert_eq!(out.choice, VoteChoice::Frame1);
    }

    #[test]
    fn hybrid_without_preference_keeps_both() {
        let a = FrameStack::new("a", at(0)).with_frames([Frame::new("x", "task", "Same", at(0))]);
        let b = FrameStack::new("b", at(0)).with_frames([Frame::new("y", "task", "Same", at(0))]);
        let conflicts = ConflictDetector::new().detect(&a, &b);
        let ctx = ResolutionContext::new();
        let input = StrategyInput {
            stack1: &a,
            stack2: &b,
            conflicts: &conflicts,
            context: &ctx,
            config: &ResolutionConfig::default(),
            detection: &DetectionConfig::default(),
            now: at(0),
        };
        let out = hybrid(&input).unwrap();
        assert_eq!(out.choice, VoteChoice::Both);
        assert!(out.resolution.strategy.confidence < 0.85);
    }

    #[test]
    fn primary_frames_fall_back_to_roots() {
        let a = FrameStack::new("a", at(0)).with_frames([Frame::new("r1", "task", "Alpha", at(0))]);
        let b = FrameStack::new("b", at(0));
        let ctx = ResolutionContext::new();
        let input = StrategyInput {
            stack1: &a,
            stack2: &b,
            conflicts: &[],
            context: &ctx,
            config: &ResolutionConfig::default(),
            detection: &DetectionConfig::default(),
            now: at(0),
        };
        let (f1, f2) = primary_frames(&input);
        assert_eq!(f1.map(|f| f.id.as_str()), Some("r1"));
        assert!(f2.is_none());
    }
}
