use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("invalid configuration value for {key}: {message}")]
    InvalidSetting { key: &'static str, message: String },

    #[error("invalid stack snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("resolution refused: {0}")]
    Resolve(#[from] fmerge_resolve::ResolveError),
}

pub type SdkResult<T> = Result<T, SdkError>;
