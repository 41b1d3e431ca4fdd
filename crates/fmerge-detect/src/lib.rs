//! Conflict detection between two parallel frame stacks.
//!
//! Three independent passes run over the stacks and their results are merged
//! into one severity-ranked list:
//!
//! 1. **Parallel solutions**: frames unique to each side that look like the
//!    same task (name, placement, or input similarity above a threshold).
//! 2. **Conflicting decisions**: decision events unique to each side that set
//!    the same target or dimension to different values.
//! 3. **Structural divergence**: parents whose child sets differ, ranked by
//!    how close to the root the divergence sits.
//!
//! Detection is pure: it never mutates its inputs and the same inputs always
//! produce the same conflicts in the same order.
//!
//! # Key Types
//!
//! - [`ConflictDetector`] -- Runs the passes under a [`DetectionConfig`]
//! - [`SimilarityScorer`] -- Pluggable frame similarity heuristic
//! - [`DecisionView`] -- Normalized view of a decision event
//! - [`SolutionAssessment`] -- Effectiveness of one parallel solution
//! - [`ConflictSummary`] -- Counts by severity and type

pub mod assessment;
pub mod config;
pub mod decision;
pub mod detector;
pub mod scoring;
pub mod summary;

pub use assessment::{effectiveness_score, SolutionAssessment};
pub use config::DetectionConfig;
pub use decision::{extract_decisions, identify_conflicting_decisions, DecisionConflict, DecisionView};
pub use detector::{detect, ConflictDetector};
pub use scoring::{
    edit_distance, map_similarity, normalized_edit_similarity, InputSimilarity, MaxScorer,
    NameSimilarity, PlacementSimilarity, SimilarityScorer,
};
pub use summary::ConflictSummary;
