//! Frame-tree arena for merge analysis.
//!
//! Frame stacks record hierarchy as `parent_id` links. This crate indexes
//! them into a flat arena with parent/children maps and provides
//! cycle-guarded depth, ancestor, and descendant queries, so a malformed
//! stack yields an error instead of an endless walk.

pub mod arena;
pub mod error;

pub use arena::FrameArena;
pub use error::{ArenaError, ArenaResult};
