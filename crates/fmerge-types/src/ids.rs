use std::fmt;

use serde::{Deserialize, Serialize};

use crate::conflict::ConflictType;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an externally assigned identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of a frame, assigned by the frame-management subsystem.
    FrameId
);

string_id!(
    /// Identifier of an event, assigned by the frame-management subsystem.
    EventId
);

string_id!(
    /// Identifier of a frame stack (one branch snapshot).
    StackId
);

/// Domain tag prepended to every conflict-id digest.
const CONFLICT_DOMAIN: &str = "fmerge-conflict-v1";

/// Content-derived identifier of a detected conflict.
///
/// The id is a BLAKE3 digest over the conflict type and the two implicated
/// subject ids, so detecting the same divergence twice yields the same id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConflictId([u8; 32]);

impl ConflictId {
    /// Derive the id for a conflict of `kind` between `left` and `right`.
    ///
    /// Each field is length-prefixed, so ids containing separators cannot
    /// collide with a different split of the same bytes.
    pub fn derive(kind: ConflictType, left: &str, right: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(CONFLICT_DOMAIN.as_bytes());
        hasher.update(b":");
        for field in [kind.as_str(), left, right] {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// The raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConflictId({})", self.short_hex())
    }
}

impl fmt::Display for ConflictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
