//! Error types for content index operations

use thiserror::Error;

/// Content index errors
///
/// Collaborator failures are surfaced as-is; nothing in this crate retries.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Timestamp store backend could not be read or written
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Content listing or visibility check failed
    #[error("Content source unavailable: {0}")]
    ContentSourceUnavailable(String),

    /// Cached index payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<redis::RedisError> for IndexError {
    fn from(err: redis::RedisError) -> Self {
        IndexError::StoreUnavailable(err.to_string())
    }
}
