//! The conflict detector: three independent passes over two frame stacks.
//!
//! Detection is pure and synchronous. Frames and decision events whose id
//! appears in both stacks are shared history; only work unique to each side
//! is compared for parallel solutions and decision conflicts. Structural
//! comparison looks at every parent id both stacks hang children under.

use std::collections::HashSet;

use fmerge_arena::FrameArena;
use fmerge_types::{
    ConflictType, EventId, Frame, FrameId, FrameStack, MergeConflict, Severity,
};
use tracing::{debug, warn};

use crate::assessment::{effectiveness_score, DisjointSet, SolutionAssessment};
use crate::config::DetectionConfig;
use crate::decision::{extract_decisions, DecisionView};
use crate::scoring::{map_similarity, MaxScorer, SimilarityScorer};

/// Detects and ranks divergence between two frame stacks.
pub struct ConflictDetector {
    config: DetectionConfig,
    scorer: Box<dyn SimilarityScorer>,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictDetector {
    /// A detector with default thresholds and the standard scorer.
    pub fn new() -> Self {
        Self::with_config(DetectionConfig::default())
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            config,
            scorer: Box::new(MaxScorer::standard()),
        }
    }

    /// Replace the frame similarity heuristic.
    pub fn with_scorer(mut self, scorer: impl SimilarityScorer + 'static) -> Self {
        self.scorer = Box::new(scorer);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Similarity of two frames under the configured scorer.
    pub fn similarity(&self, a: &Frame, b: &Frame) -> f64 {
        self.scorer.score(a, b)
    }

    /// Effectiveness of a frame as a finished solution.
    pub fn effectiveness(&self, frame: &Frame) -> f64 {
        effectiveness_score(frame, &self.config)
    }

    /// Run all three passes and return the conflicts ranked by severity
    /// (highest first), then by type and id.
    pub fn detect(&self, stack1: &FrameStack, stack2: &FrameStack) -> Vec<MergeConflict> {
        let mut conflicts = self.detect_parallel_solutions(stack1, stack2);
        conflicts.extend(self.detect_conflicting_decisions(stack1, stack2));
        conflicts.extend(self.detect_structural_divergence(stack1, stack2));

        conflicts.sort_by(|a, b| {
            b.severity
                .cmp(&a.severity)
                .then(a.conflict_type.cmp(&b.conflict_type))
                .then(a.id.cmp(&b.id))
        });

        debug!(
            stack1 = %stack1.id,
            stack2 = %stack2.id,
            conflicts = conflicts.len(),
            "conflict detection complete"
        );
        conflicts
    }

    // ---------------------------------------------------------------
    // Parallel solutions
    // ---------------------------------------------------------------

    /// Frames unique to each side that look like the same piece of work.
    pub fn detect_parallel_solutions(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
    ) -> Vec<MergeConflict> {
        let ids1 = stack1.frame_ids();
        let ids2 = stack2.frame_ids();
        let only1: Vec<&Frame> = stack1.frames.iter().filter(|f| !ids2.contains(&f.id)).collect();
        let only2: Vec<&Frame> = stack2.frames.iter().filter(|f| !ids1.contains(&f.id)).collect();

        let mut conflicts = Vec::new();
        for a in &only1 {
            for b in &only2 {
                if a.id == b.id {
                    continue;
                }
                let similarity = self.scorer.score(a, b);
                if similarity <= self.config.parallel_threshold {
                    continue;
                }
                let severity = self.parallel_severity(a, b);
                debug!(frame1 = %a.id, frame2 = %b.id, similarity, %severity, "parallel solution");
                conflicts.push(MergeConflict::between_frames(
                    ConflictType::ParallelSolution,
                    a.id.clone(),
                    b.id.clone(),
                    severity,
                    format!(
                        "'{}' and '{}' look like parallel solutions (similarity {:.2})",
                        a.name, b.name, similarity
                    ),
                ));
            }
        }
        conflicts
    }

    /// Severity of a parallel-solution pair.
    ///
    /// Critical when both are closed and their outputs mostly disagree;
    /// high when outputs disagree somewhat or the frames share a parent;
    /// medium otherwise. No outputs on either side counts as agreement.
    pub fn parallel_severity(&self, a: &Frame, b: &Frame) -> Severity {
        let output_similarity = map_similarity(&a.outputs, &b.outputs).unwrap_or(1.0);
        let shared_parent =
            matches!((&a.parent_id, &b.parent_id), (Some(pa), Some(pb)) if pa == pb);

        if a.is_closed()
            && b.is_closed()
            && output_similarity < self.config.critical_output_threshold
        {
            Severity::Critical
        } else if output_similarity < self.config.high_output_threshold || shared_parent {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    // ---------------------------------------------------------------
    // Conflicting decisions
    // ---------------------------------------------------------------

    /// Decision events unique to each side that contradict each other.
    pub fn detect_conflicting_decisions(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
    ) -> Vec<MergeConflict> {
        let ids1: HashSet<&EventId> = stack1.events.iter().map(|e| &e.id).collect();
        let ids2: HashSet<&EventId> = stack2.events.iter().map(|e| &e.id).collect();
        let decisions1: Vec<DecisionView<'_>> = extract_decisions(&stack1.events)
            .into_iter()
            .filter(|d| !ids2.contains(&d.event.id))
            .collect();
        let decisions2: Vec<DecisionView<'_>> = extract_decisions(&stack2.events)
            .into_iter()
            .filter(|d| !ids1.contains(&d.event.id))
            .collect();

        let mut conflicts = Vec::new();
        for d1 in &decisions1 {
            for d2 in &decisions2 {
                if !d1.conflicts_with(d2) {
                    continue;
                }
                let severity = d1.impact(d2);
                debug!(event1 = %d1.event.id, event2 = %d2.event.id, %severity, "conflicting decision");
                conflicts.push(MergeConflict::between_events(
                    ConflictType::ConflictingDecision,
                    (d1.event.id.clone(), d1.event.frame_id.clone()),
                    (d2.event.id.clone(), d2.event.frame_id.clone()),
                    severity,
                    format!(
                        "decisions on {} disagree: {} vs {}",
                        d1.subject(d2),
                        d1.value_label(),
                        d2.value_label()
                    ),
                ));
            }
        }
        conflicts
    }

    // ---------------------------------------------------------------
    // Structural divergence
    // ---------------------------------------------------------------

    /// Parent frames whose child sets differ between the two stacks.
    ///
    /// Severity follows the parent's depth in the first stack. A parent
    /// whose depth cannot be computed (missing, dangling, or cyclic chain)
    /// is logged and skipped; other comparisons still run.
    pub fn detect_structural_divergence(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
    ) -> Vec<MergeConflict> {
        let arena1 = FrameArena::build(&stack1.frames);
        let arena2 = FrameArena::build(&stack2.frames);

        let mut conflicts = Vec::new();
        for (parent, children1) in arena1.child_index() {
            let Some(children2) = arena2.children_of(parent) else {
                continue;
            };
            if children1 == children2 {
                continue;
            }

            let depth = match arena1.depth(parent) {
                Ok(depth) => depth,
                Err(err) => {
                    warn!(parent = %parent, error = %err, "skipping structural comparison");
                    continue;
                }
            };

            let only1: Vec<&FrameId> = children1.difference(children2).copied().collect();
            let only2: Vec<&FrameId> = children2.difference(children1).copied().collect();
            let paths = only1
                .iter()
                .chain(only2.iter())
                .map(|child| format!("{parent}/{child}"))
                .collect();

            let severity = Severity::from_depth(depth);
            debug!(parent = %parent, depth, %severity, "structural divergence");
            conflicts.push(
                MergeConflict::between_frames(
                    ConflictType::StructuralDivergence,
                    (*parent).clone(),
                    (*parent).clone(),
                    severity,
                    format!(
                        "children of '{parent}' diverge at depth {depth}: {} only in {}, {} only in {}",
                        only1.len(),
                        stack1.id,
                        only2.len(),
                        stack2.id
                    ),
                )
                .with_paths(paths),
            );
        }
        conflicts
    }

    // ---------------------------------------------------------------
    // Solution analysis
    // ---------------------------------------------------------------

    /// Cluster frames transitively by the parallel-solution predicate and
    /// score every frame that landed in a cluster of two or more.
    pub fn analyze_parallel_solutions(&self, frames: &[Frame]) -> Vec<SolutionAssessment> {
        let mut clusters = DisjointSet::new(frames.len());
        for (i, a) in frames.iter().enumerate() {
            for (j, b) in frames.iter().enumerate().skip(i + 1) {
                if a.id != b.id && self.scorer.score(a, b) > self.config.parallel_threshold {
                    clusters.union(i, j);
                }
            }
        }

        let roots: Vec<usize> = (0..frames.len()).map(|i| clusters.find(i)).collect();
        let mut sizes = vec![0usize; frames.len()];
        for &root in &roots {
            sizes[root] += 1;
        }

        // Number clusters in the order their first member appears.
        let mut numbering: Vec<Option<usize>> = vec![None; frames.len()];
        let mut next = 0;
        let mut assessments = Vec::new();
        for (frame, &root) in frames.iter().zip(&roots) {
            if sizes[root] < 2 {
                continue;
            }
            let cluster = *numbering[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            });
            assessments.push(SolutionAssessment {
                frame_id: frame.id.clone(),
                cluster,
                cluster_size: sizes[root],
                effectiveness: self.effectiveness(frame),
                is_closed: frame.is_closed(),
                has_outputs: frame.has_outputs(),
            });
        }
        assessments
    }
}

/// Detect conflicts with the default detector.
pub fn detect(stack1: &FrameStack, stack2: &FrameStack) -> Vec<MergeConflict> {
    ConflictDetector::new().detect(stack1, stack2)
}
