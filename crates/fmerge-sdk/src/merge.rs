//! The `FrameMerge` facade.

use fmerge_arena::{ArenaError, FrameArena};
use fmerge_detect::{ConflictDetector, ConflictSummary, SolutionAssessment};
use fmerge_resolve::{ResolutionContext, ResolutionEngine};
use fmerge_types::{Frame, FrameStack, MergeConflict, MergeResult, StrategyKind};
use fmerge_viz::{ConflictMarker, DiffTree, DiffVisualizer, MergePreview};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::MergeConfig;
use crate::error::SdkResult;

/// Everything a reviewer needs before choosing a strategy, from one
/// detection pass.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MergeReview {
    pub conflicts: Vec<MergeConflict>,
    pub summary: ConflictSummary,
    pub markers: Vec<ConflictMarker>,
    pub preview: MergePreview,
}

/// One entry point over detection, visualization, and resolution.
///
/// All three components share the thresholds of a single [`MergeConfig`].
pub struct FrameMerge {
    config: MergeConfig,
    detector: ConflictDetector,
    visualizer: DiffVisualizer,
    engine: ResolutionEngine,
}

impl Default for FrameMerge {
    fn default() -> Self {
        Self::with_config(MergeConfig::default())
    }
}

impl FrameMerge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MergeConfig) -> Self {
        let visualizer = DiffVisualizer::new()
            .with_detector(ConflictDetector::with_config(config.detection.clone()))
            .with_preview_config(config.preview.clone())
            .with_layout(config.layout);
        let engine = ResolutionEngine::new(config.resolution.clone())
            .with_detector(ConflictDetector::with_config(config.detection.clone()));
        Self {
            detector: ConflictDetector::with_config(config.detection.clone()),
            visualizer,
            engine,
            config,
        }
    }

    /// Build a facade from TOML configuration text.
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        MergeConfig::from_toml_str(text).map(Self::with_config)
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Mutable access to the engine, e.g. to add preconditions.
    pub fn engine_mut(&mut self) -> &mut ResolutionEngine {
        &mut self.engine
    }

    // ---------------------------------------------------------------
    // Input
    // ---------------------------------------------------------------

    /// Parse a stack snapshot exported as JSON.
    pub fn load_stack(json: &str) -> SdkResult<FrameStack> {
        let stack: FrameStack = serde_json::from_str(json)?;
        debug!(
            stack = %stack.id,
            frames = stack.frames.len(),
            events = stack.events.len(),
            "loaded stack snapshot"
        );
        Ok(stack)
    }

    /// Malformed parent links in `stack`: dangling parents and cycles.
    ///
    /// Detection tolerates these by skipping the affected comparisons; this
    /// lists them so a caller can reject the snapshot up front.
    pub fn check_stack(stack: &FrameStack) -> Vec<ArenaError> {
        let arena = FrameArena::build(&stack.frames);
        let mut issues: Vec<ArenaError> = Vec::new();
        for frame in &stack.frames {
            if let Err(err) = arena.depth(&frame.id) {
                if !issues.contains(&err) {
                    issues.push(err);
                }
            }
        }
        if !issues.is_empty() {
            warn!(stack = %stack.id, issues = issues.len(), "malformed parent links");
        }
        issues
    }

    // ---------------------------------------------------------------
    // Detection
    // ---------------------------------------------------------------

    pub fn detect(&self, stack1: &FrameStack, stack2: &FrameStack) -> Vec<MergeConflict> {
        self.detector.detect(stack1, stack2)
    }

    pub fn summarize(&self, stack1: &FrameStack, stack2: &FrameStack) -> ConflictSummary {
        ConflictSummary::from_conflicts(&self.detect(stack1, stack2))
    }

    pub fn analyze_parallel_solutions(&self, frames: &[Frame]) -> Vec<SolutionAssessment> {
        self.detector.analyze_parallel_solutions(frames)
    }

    // ---------------------------------------------------------------
    // Visualization
    // ---------------------------------------------------------------

    pub fn visualize(&self, base: &Frame, stack1: &FrameStack, stack2: &FrameStack) -> DiffTree {
        self.visualizer.visualize_divergence(base, stack1, stack2)
    }

    pub fn markers(&self, conflicts: &[MergeConflict]) -> Vec<ConflictMarker> {
        self.visualizer.render_conflict_markers(conflicts)
    }

    pub fn preview(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        strategy: Option<StrategyKind>,
    ) -> MergePreview {
        self.visualizer.generate_merge_preview(stack1, stack2, strategy)
    }

    /// Conflicts, summary, markers, and preview from a single detection.
    pub fn review(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        strategy: Option<StrategyKind>,
    ) -> MergeReview {
        let conflicts = self.detect(stack1, stack2);
        MergeReview {
            summary: ConflictSummary::from_conflicts(&conflicts),
            markers: self.markers(&conflicts),
            preview: self
                .visualizer
                .preview_with_conflicts(stack1, stack2, &conflicts, strategy),
            conflicts,
        }
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    pub fn resolve(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        strategy: StrategyKind,
        context: &ResolutionContext,
    ) -> SdkResult<MergeResult> {
        Ok(self.engine.resolve_conflicts(stack1, stack2, strategy, context)?)
    }

    /// Like [`resolve`](Self::resolve), but a refused request comes back as
    /// an unsuccessful [`MergeResult`] carrying the error message.
    pub fn try_resolve(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        strategy: StrategyKind,
        context: &ResolutionContext,
    ) -> MergeResult {
        self.resolve(stack1, stack2, strategy, context)
            .unwrap_or_else(|err| MergeResult::failed(err.to_string()))
    }
}
