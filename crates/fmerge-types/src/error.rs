use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown {kind} tag: {value:?}")]
    UnknownTag { kind: &'static str, value: String },

    #[error("confidence out of range [0, 1]: {0}")]
    ConfidenceOutOfRange(String),
}

impl TypeError {
    /// Build an unknown-tag error for the given tag family.
    pub fn unknown_tag(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownTag {
            kind,
            value: value.into(),
        }
    }
}
