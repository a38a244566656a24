/// Errors produced by canvas-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("element not found: {0}")]
    NotFound(String),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
