//! Error types for the frame arena.

use fmerge_types::FrameId;

/// Malformed-input errors found while walking a frame tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// The requested frame is not in the arena.
    #[error("frame not found: {0}")]
    FrameNotFound(FrameId),

    /// A parent reference points to a frame that is not in the arena.
    #[error("dangling parent reference: frame {frame} references missing parent {parent}")]
    DanglingParent {
        /// The frame containing the bad reference.
        frame: FrameId,
        /// The missing parent.
        parent: FrameId,
    },

    /// Walking parent links revisited a frame.
    #[error("cyclic parent chain involving frame {0}")]
    CycleDetected(FrameId),
}

/// Convenience alias for arena results.
pub type ArenaResult<T> = Result<T, ArenaError>;
