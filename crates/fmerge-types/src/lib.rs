//! Foundation types for merging parallel agent frame stacks.
//!
//! This crate provides the frame/event snapshot model consumed from the
//! frame-management subsystem, plus the conflict, strategy, and result types
//! shared by the detector, visualizer, and resolution engine.
//!
//! # Key Types
//!
//! - [`Frame`] / [`Event`] / [`FrameStack`] -- Read-only snapshots of one branch
//! - [`MergeConflict`] -- A typed, severity-ranked divergence
//! - [`Severity`] -- `Low < Medium < High < Critical`
//! - [`ResolutionStrategy`] / [`StrategyKind`] -- How a conflict was decided
//! - [`MergeResult`] -- The merge plan handed back to the caller

pub mod conflict;
pub mod error;
pub mod frame;
pub mod ids;
pub mod result;
pub mod stack;
pub mod strategy;

pub use conflict::{ConflictResolution, ConflictType, MergeConflict, Severity};
pub use error::TypeError;
pub use frame::{Event, Frame, FrameState};
pub use ids::{ConflictId, EventId, FrameId, StackId};
pub use result::{MergeResult, NotificationOutcome, RollbackPoint};
pub use stack::FrameStack;
pub use strategy::{ResolutionStrategy, Role, StrategyKind, TeamVote, VoteChoice};
