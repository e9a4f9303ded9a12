//! # Store Errors

use thiserror::Error;

use crate::replication::ReplicationError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Value store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Replication(#[from] ReplicationError),
}
