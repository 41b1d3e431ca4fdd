//! High-level SDK for merging parallel frame stacks.
//!
//! [`FrameMerge`] wires the conflict detector, diff visualizer, and
//! resolution engine together under one [`MergeConfig`], so callers load a
//! configuration once and work with a single handle.
//!
//! ```no_run
//! use fmerge_sdk::{FrameMerge, ResolutionContext, StrategyKind};
//!
//! # fn run(a_json: &str, b_json: &str) -> fmerge_sdk::SdkResult<()> {
//! let merge = FrameMerge::new();
//! let a = FrameMerge::load_stack(a_json)?;
//! let b = FrameMerge::load_stack(b_json)?;
//!
//! let review = merge.review(&a, &b, None);
//! if !review.summary.requires_review() {
//!     let result = merge.resolve(&a, &b, StrategyKind::KeepBoth, &ResolutionContext::new())?;
//!     println!("kept {} frames", result.merged_frames.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Key Types
//!
//! - [`FrameMerge`] -- Detection, visualization, and resolution in one place
//! - [`MergeReview`] -- Conflicts, summary, markers, and preview together
//! - [`MergeConfig`] -- TOML-loadable settings for every component
//! - [`SdkError`] -- Configuration, snapshot, and resolution failures

pub mod config;
pub mod error;
pub mod merge;

pub use config::MergeConfig;
pub use error::{SdkError, SdkResult};
pub use merge::{FrameMerge, MergeReview};

pub use fmerge_arena::ArenaError;
pub use fmerge_detect::{ConflictSummary, DetectionConfig, SolutionAssessment};
pub use fmerge_resolve::{ResolutionConfig, ResolutionContext, ResolveError};
pub use fmerge_types::{
    ConflictType, Event, Frame, FrameId, FrameStack, MergeConflict, MergeResult, Role, Severity,
    StrategyKind, TeamVote, VoteChoice,
};
pub use fmerge_viz::{ConflictMarker, DiffTree, LayoutMode, MergePreview, PreviewConfig};
