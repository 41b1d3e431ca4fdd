//! Visual structures for reviewing a merge of two frame stacks.
//!
//! Produces a divergence tree laid out over a shared base frame, per-frame
//! conflict markers with fixed colors and glyphs, and a preview of what
//! merging every frame would yield, with an estimated success score.
//!
//! # Key Types
//!
//! - [`DiffVisualizer`] -- Entry point; runs detection when not given conflicts
//! - [`DiffTree`] / [`DiffNode`] / [`DiffEdge`] -- Tagged, positioned graph
//! - [`ConflictMarker`] -- Badge for one implicated frame
//! - [`MergePreview`] / [`PreviewConfig`] -- Merge-everything estimate

pub mod layout;
pub mod markers;
pub mod preview;
pub mod tree;
pub mod visualizer;

pub use layout::{LayoutMode, Position};
pub use markers::{conflict_symbol, render_conflict_markers, severity_color, ConflictMarker, MarkerKind};
pub use preview::{build_preview, MergePreview, PreviewConfig};
pub use tree::{build_tree, content_differs, DiffEdge, DiffEdgeKind, DiffNode, DiffNodeKind, DiffTree, NodeMetadata};
pub use visualizer::DiffVisualizer;
