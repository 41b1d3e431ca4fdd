//! The visualizer entry point.

use fmerge_detect::ConflictDetector;
use fmerge_types::{Frame, FrameStack, MergeConflict, StrategyKind};
use tracing::debug;

use crate::layout::LayoutMode;
use crate::markers::{render_conflict_markers, ConflictMarker};
use crate::preview::{build_preview, MergePreview, PreviewConfig};
use crate::tree::{build_tree, DiffTree};

/// Turns stacks and conflicts into renderable structures.
///
/// Methods that take no conflict list run detection themselves; the
/// `*_with_conflicts` variants reuse a list the caller already has.
#[derive(Default)]
pub struct DiffVisualizer {
    detector: ConflictDetector,
    preview: PreviewConfig,
    layout: LayoutMode,
}

impl DiffVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(mut self, detector: ConflictDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_preview_config(mut self, config: PreviewConfig) -> Self {
        self.preview = config;
        self
    }

    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    pub fn preview_config(&self) -> &PreviewConfig {
        &self.preview
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    /// Divergence tree of both stacks relative to `base`.
    pub fn visualize_divergence(
        &self,
        base: &Frame,
        stack1: &FrameStack,
        stack2: &FrameStack,
    ) -> DiffTree {
        let conflicts = self.detector.detect(stack1, stack2);
        self.visualize_with_conflicts(base, stack1, stack2, &conflicts)
    }

    pub fn visualize_with_conflicts(
        &self,
        base: &Frame,
        stack1: &FrameStack,
        stack2: &FrameStack,
        conflicts: &[MergeConflict],
    ) -> DiffTree {
        build_tree(base, stack1, stack2, conflicts, self.layout)
    }

    pub fn render_conflict_markers(&self, conflicts: &[MergeConflict]) -> Vec<ConflictMarker> {
        render_conflict_markers(conflicts)
    }

    /// Preview of merging every frame of both stacks.
    pub fn generate_merge_preview(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        strategy: Option<StrategyKind>,
    ) -> MergePreview {
        let conflicts = self.detector.detect(stack1, stack2);
        self.preview_with_conflicts(stack1, stack2, &conflicts, strategy)
    }

    pub fn preview_with_conflicts(
        &self,
        stack1: &FrameStack,
        stack2: &FrameStack,
        conflicts: &[MergeConflict],
        strategy: Option<StrategyKind>,
    ) -> MergePreview {
        let preview = build_preview(stack1, stack2, conflicts, strategy, &self.preview);
        debug!(
            merged = preview.merged_frames.len(),
            conflicts = preview.total_conflicts,
            estimated_success = preview.estimated_success,
            "generated merge preview"
        );
        preview
    }
}
