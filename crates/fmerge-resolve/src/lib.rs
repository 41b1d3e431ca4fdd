//! Resolution engine for merging two frame stacks.
//!
//! A caller picks a strategy and supplies context (role, votes, AI
//! confidence). The engine validates the strategy's preconditions first,
//! then detects conflicts, dispatches to the strategy, and assembles a
//! [`MergeResult`](fmerge_types::MergeResult) plan. Failures are returned
//! as [`ResolveError`] with nothing partially resolved.
//!
//! # Key Types
//!
//! - [`ResolutionEngine`] -- Validate, detect, resolve
//! - [`ResolutionContext`] -- Caller-supplied role, votes, and preferences
//! - [`Precondition`] -- One check in the validation pipeline
//! - [`StrategyFn`] / [`strategy_for`] -- The strategy dispatch table
//! - [`ResolutionConfig`] -- Fixed confidences and floors

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod preconditions;
pub mod strategies;

pub use config::ResolutionConfig;
pub use context::ResolutionContext;
pub use engine::{merged_frames, ResolutionEngine};
pub use error::{ResolveError, ResolveResult};
pub use preconditions::{
    standard_preconditions, validate, ConfidenceInRange, Precondition, RoleCanOverride,
    VotesPresent,
};
pub use strategies::{
    ai_suggest, hybrid, keep_both, senior_override, strategy_for, team_vote, StrategyFn,
    StrategyInput, StrategyOutcome,
};
