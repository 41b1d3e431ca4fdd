use std::collections::HashSet;

use chrono::Utc;
use fmerge_detect::ConflictDetector;
use fmerge_types::{
    ConflictType, FrameId, FrameStack, MergeConflict, MergeResult, RollbackPoint, StrategyKind,
    VoteChoice,
};
use tracing::{debug, info, warn};

use crate::config::ResolutionConfig;
use crate::context::ResolutionContext;
use crate::error::ResolveResult;
use crate::preconditions::{standard_preconditions, validate, Precondition};
use crate::strategies::{strategy_for, StrategyInput};

/// Applies a caller-selected strategy to two stacks.
///
/// Preconditions are validated before detection runs; a refused request
/// does no work and exposes no partial result.
pub struct ResolutionEngine {
    config: ResolutionConfig,
    detector: ConflictDetector,
    preconditions: Vec<Box<dyn Precondition>>,
}

impl Default for ResolutionEngine {
    fn default() -> Self {
        Self::new(ResolutionConfig::default())
    }
}

impl ResolutionEngine {
    /// An engine with the standard precondition checks.
    pub fn new(config: ResolutionConfig) -> Self {
        Self {
            config,
            detector: ConflictDetector::new(),
            preconditions: standard_preconditions(),
        }
    }

    pub fn with_detector(mut self, detector: ConflictDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Append a check to the end of the precondition pipeline.
    pub fn add_precondition(&mut self, check: Box<dyn Precondition>) {
        self.preconditions.push(check);
    }

    pub fn config(&self) -> &ResolutionConfig {
        &self.config
    }

    pub fn precondition_count(&self) -> usize {
        self.preconditions.len()
    }

    /// Validate, detect, and resolve.
    pub fn resolve_conflicts(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        strategy: StrategyKind,
        context: &ResolutionContext,
    ) -> ResolveResult<MergeResult> {
        self.validate(strategy, context)?;
        let conflicts = self.detector.detect(stack1, stack2);
        self.apply(stack1, stack2, conflicts, strategy, context)
    }

    /// Resolve against conflicts the caller already detected.
    pub fn resolve_with_conflicts(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        conflicts: &[MergeConflict],
        strategy: StrategyKind,
        context: &ResolutionContext,
    ) -> ResolveResult<MergeResult> {
        self.validate(strategy, context)?;
        self.apply(stack1, stack2, conflicts.to_vec(), strategy, context)
    }

    fn validate(&self, strategy: StrategyKind, context: &ResolutionContext) -> ResolveResult<()> {
        validate(&self.preconditions, strategy, context).inspect_err(|err| {
            warn!(%strategy, error = %err, "resolution refused");
        })
    }

    fn apply(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        mut conflicts: Vec<MergeConflict>,
        strategy: StrategyKind,
        context: &ResolutionContext,
    ) -> ResolveResult<MergeResult> {
        let input = StrategyInput {
            stack1,
            stack2,
            conflicts: &conflicts,
            context,
            config: &self.config,
            detection: self.detector.config(),
            now: Utc::now(),
        };
        let outcome = strategy_for(strategy)(&input)?;
        debug!(%strategy, choice = %outcome.choice, "strategy decided");

        let merged_frames = merged_frames(stack1, stack2, &conflicts, outcome.choice);
        for conflict in &mut conflicts {
            conflict.resolution = Some(outcome.resolution.clone());
        }

        info!(
            %strategy,
            stack1 = %stack1.id,
            stack2 = %stack2.id,
            conflicts = conflicts.len(),
            merged = merged_frames.len(),
            confidence = outcome.resolution.strategy.confidence,
            "resolved merge"
        );

        Ok(MergeResult {
            success: true,
            merged_frame_id: outcome.resolution.merged_frame_id.clone(),
            merged_frames,
            conflicts,
            resolution: Some(outcome.resolution),
            rollback_point: Some(RollbackPoint {
                stack_id: stack1.id.clone(),
                frame_count: stack1.frames.len(),
                captured_at: stack1.modified_at,
            }),
            notifications: None,
            error: None,
        })
    }
}

/// Frame ids the plan keeps for `choice`.
///
/// Starts from the union of both stacks (first stack's order first) and
/// drops the losing side's competing frames. Only frames unique to the
/// losing stack are dropped; structural conflicts never drop anything.
pub fn merged_frames(
    stack1: &FrameStack,
    stack2: &FrameStack,
    conflicts: &[MergeConflict],
    choice: VoteChoice,
) -> Vec<FrameId> {
    let ids1 = stack1.frame_ids();
    let ids2 = stack2.frame_ids();

    let mut dropped: HashSet<&FrameId> = HashSet::new();
    for conflict in conflicts
        .iter()
        .filter(|c| c.conflict_type != ConflictType::StructuralDivergence)
    {
        if !choice.keeps_first() && !ids2.contains(&conflict.frame1) {
            dropped.insert(&conflict.frame1);
        }
        if !choice.keeps_second() && !ids1.contains(&conflict.frame2) {
            dropped.insert(&conflict.frame2);
        }
    }

    let mut seen: HashSet<&FrameId> = HashSet::new();
    stack1
        .frames
        .iter()
        .chain(&stack2.frames)
        .map(|f| &f.id)
        .filter(|id| seen.insert(*id) && !dropped.contains(id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use fmerge_types::{Event, Frame, Role, TeamVote};
    use serde_json::json;

    use crate::error::ResolveError;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn stacks() -> (FrameStack, FrameStack) {
        let shared = Frame::new("root", "session", "Session", at(0));
        let a = FrameStack::new("a", at(0)).with_frames([
            shared.clone(),
            Frame::new("fa", "task", "Fix Authentication Bug", at(1))
                .with_output("solution", json!("Refactored entire auth system"))
                .closed(at(60)),
            Frame::new("docs", "task", "Write changelog", at(2)),
        ]);
        let b = FrameStack::new("b", at(0)).with_frames([
            shared,
            Frame::new("fb", "task", "Fix Authentication Bug", at(1))
                .with_output("solution", json!("Applied minimal patch")),
        ]);
        (a, b)
    }

    fn ids(v: &[FrameId]) -> Vec<&str> {
        v.iter().map(FrameId::as_str).collect()
    }

    #[test]
    fn keep_both_keeps_everything() {
        let (a, b) = stacks();
        let result = ResolutionEngine::default()
            .resolve_conflicts(&a, &b, StrategyKind::KeepBoth, &ResolutionContext::new())
            .unwrap();

        assert!(result.success);
        assert_eq!(ids(&result.merged_frames), ["root", "fa", "docs", "fb"]);
        assert_eq!(result.strategy().unwrap().confidence, 1.0);
        assert_eq!(result.strategy().unwrap().kind, StrategyKind::KeepBoth);
        assert_eq!(result.merged_frame_id, None);
        assert!(result.error.is_none());
    }

    #[test]
    fn conflicts_carry_the_resolution() {
        let (a, b) = stacks();
        let result = ResolutionEngine::default()
            .resolve_conflicts(&a, &b, StrategyKind::KeepBoth, &ResolutionContext::new())
            .unwrap();
        assert_eq!(result.conflicts.len(), 1);
        assert!(result.conflicts.iter().all(MergeConflict::is_resolved));
        let rollback = result.rollback_point.unwrap();
        assert_eq!(rollback.stack_id.as_str(), "a");
        assert_eq!(rollback.frame_count, 3);
        assert!(result.notifications.is_none());
    }

    #[test]
    fn team_vote_drops_the_losing_solution() {
        let (a, b) = stacks();
        let ctx = ResolutionContext::new().with_votes([
            TeamVote::new("v1", VoteChoice::Frame1, at(5)),
            TeamVote::new("v2", VoteChoice::Frame1, at(6)),
            TeamVote::new("v3", VoteChoice::Frame2, at(7)),
        ]);
        let result = ResolutionEngine::default()
            .resolve_conflicts(&a, &b, StrategyKind::TeamVote, &ctx)
            .unwrap();

        let strategy = result.strategy().unwrap();
        assert_eq!(strategy.kind, StrategyKind::TeamVote);
        assert!((strategy.confidence - 0.667).abs() < 1e-3);
        assert_eq!(strategy.votes.as_ref().map(Vec::len), Some(3));
        assert_eq!(ids(&result.merged_frames), ["root", "fa", "docs"]);
        assert_eq!(result.merged_frame_id.as_ref().map(FrameId::as_str), Some("fa"));
    }

    #[test]
    fn preconditions_fail_before_anything_else() {
        let (a, b) = stacks();
        let engine = ResolutionEngine::default();

        let no_votes = engine.resolve_conflicts(&a, &b, StrategyKind::TeamVote, &ResolutionContext::new());
        assert_eq!(no_votes.unwrap_err(), ResolveError::VotesRequired);

        let junior = ResolutionContext::for_user("j").with_role(Role::Junior);
        let refused = engine.resolve_conflicts(&a, &b, StrategyKind::SeniorOverride, &junior);
        assert!(matches!(refused, Err(ResolveError::InsufficientRole { .. })));
    }

    #[test]
    fn senior_and_lead_override() {
        let (a, b) = stacks();
        for role in [Role::Senior, Role::Lead] {
            let ctx = ResolutionContext::for_user("boss")
                .with_role(role)
                .with_choice(VoteChoice::Frame2);
            let result = ResolutionEngine::default()
                .resolve_conflicts(&a, &b, StrategyKind::SeniorOverride, &ctx)
                .unwrap();
            let resolution = result.resolution.as_ref().unwrap();
            assert!(resolution.strategy.confidence > 0.9);
            assert_eq!(resolution.resolved_by, "boss");
            assert_eq!(ids(&result.merged_frames), ["root", "docs", "fb"]);
        }
    }

    /// Both solutions hang under a shared session root, so the root's
    /// structural divergence outranks the parallel solution.
    fn nested_stacks() -> (FrameStack, FrameStack) {
        let root = Frame::new("root", "session", "Session", at(0));
        let a = FrameStack::new("a", at(0)).with_frames([
            root.clone(),
            Frame::new("fa", "task", "Fix Authentication Bug", at(1))
                .with_parent("root", 1)
                .with_output("solution", json!("Refactored entire auth system"))
                .closed(at(3600)),
        ]);
        let b = FrameStack::new("b", at(0)).with_frames([
            root,
            Frame::new("fb", "task", "Fix Authentication Bug", at(2))
                .with_parent("root", 1)
                .with_output("solution", json!("Applied minimal patch")),
        ]);
        (a, b)
    }

    #[test]
    fn side_choice_ignores_structural_divergence_of_shared_root() {
        let (a, b) = nested_stacks();
        let engine = ResolutionEngine::default();

        let conflicts = ConflictDetector::new().detect(&a, &b);
        assert_eq!(conflicts[0].conflict_type, ConflictType::StructuralDivergence);
        assert_eq!(conflicts[1].conflict_type, ConflictType::ParallelSolution);

        let ai = engine
            .resolve_conflicts(&a, &b, StrategyKind::AiSuggest, &ResolutionContext::new())
            .unwrap();
        assert_eq!(ai.merged_frame_id, Some(FrameId::from("fa")));
        assert_eq!(ids(&ai.merged_frames), ["root", "fa"]);

        let votes = ResolutionContext::new().with_votes([
            TeamVote::new("v1", VoteChoice::Frame2, at(10)),
            TeamVote::new("v2", VoteChoice::Frame2, at(11)),
        ]);
        let team = engine
            .resolve_conflicts(&a, &b, StrategyKind::TeamVote, &votes)
            .unwrap();
        assert_eq!(team.merged_frame_id, Some(FrameId::from("fb")));
        assert_eq!(ids(&team.merged_frames), ["root", "fb"]);

        let lead = ResolutionContext::for_user("boss")
            .with_role(Role::Lead)
            .with_choice(VoteChoice::Frame2);
        let over = engine
            .resolve_conflicts(&a, &b, StrategyKind::SeniorOverride, &lead)
            .unwrap();
        assert_eq!(over.merged_frame_id, Some(FrameId::from("fb")));

        let hybrid = engine
            .resolve_conflicts(&a, &b, StrategyKind::Hybrid, &ResolutionContext::new())
            .unwrap();
        assert_eq!(hybrid.merged_frame_id, Some(FrameId::from("fa")));
        assert!(hybrid.strategy().unwrap().confidence > 0.85);
    }

    #[test]
    fn every_strategy_echoes_its_kind() {
        let (a, b) = stacks();
        let ctx = ResolutionContext::for_user("lead")
            .with_role(Role::Lead)
            .with_vote(TeamVote::new("v", VoteChoice::Both, at(1)))
            .with_ai_confidence(0.8);
        let engine = ResolutionEngine::default();
        for kind in StrategyKind::ALL {
            let result = engine.resolve_conflicts(&a, &b, kind, &ctx).unwrap();
            assert_eq!(result.strategy().map(|s| s.kind), Some(kind));
        }
    }

    #[test]
    fn neither_drops_both_sides_but_keeps_shared() {
        let (a, b) = stacks();
        let conflicts = ConflictDetector::new().detect(&a, &b);
        let kept = merged_frames(&a, &b, &conflicts, VoteChoice::Neither);
        assert_eq!(ids(&kept), ["root", "docs"]);
    }

    #[test]
    fn decision_conflicts_drop_the_losing_owner() {
        let a = FrameStack::new("a", at(0))
            .with_frames([Frame::new("fa", "task", "Pick database", at(0))])
            .with_events([Event::new("ea", "fa", "decision", at(1))
                .with_field("category", json!("database"))
                .with_field("decision", json!("postgres"))]);
        let b = FrameStack::new("b", at(0))
            .with_frames([Frame::new("fb", "task", "Choose storage", at(0))])
            .with_events([Event::new("eb", "fb", "decision", at(1))
                .with_field("category", json!("database"))
                .with_field("decision", json!("sqlite"))]);
        let ctx = ResolutionContext::for_user("l")
            .with_role(Role::Lead)
            .with_choice(VoteChoice::Frame1);
        let result = ResolutionEngine::default()
            .resolve_conflicts(&a, &b, StrategyKind::SeniorOverride, &ctx)
            .unwrap();
        assert_eq!(ids(&result.merged_frames), ["fa"]);
    }

    struct Frozen;

    impl Precondition for Frozen {
        fn name(&self) -> &str {
            "frozen"
        }

        fn applies_to(&self, _: StrategyKind) -> bool {
            true
        }

        fn check(&self, strategy: StrategyKind, _: &ResolutionContext) -> ResolveResult<()> {
            Err(ResolveError::precondition(self.name(), strategy, "merges are frozen"))
        }
    }

    #[test]
    fn custom_preconditions_run_in_the_pipeline() {
        let (a, b) = stacks();
        let mut engine = ResolutionEngine::default();
        engine.add_precondition(Box::new(Frozen));
        assert_eq!(engine.precondition_count(), 4);

        let err = engine
            .resolve_conflicts(&a, &b, StrategyKind::KeepBoth, &ResolutionContext::new())
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("merges are frozen"));
    }
}
