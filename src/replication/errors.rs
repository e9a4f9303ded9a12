//! Replication Error Types
//!
//! Nothing in push replication is fatal to the process. Failures inside a
//! pass degrade to "try again next pass" and are logged, not returned; the
//! errors here surface only at the edges (layout validation, control
//! requests against a stopped loop, configuration).

use thiserror::Error;

/// Replication error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ReplicationError({kind:?}): {message}")]
pub struct ReplicationError {
    /// Error kind
    pub kind: ReplicationErrorKind,
    /// Error message
    pub message: String,
}

/// Replication error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationErrorKind {
    /// Ring geometry cannot be tiled (bad partition bit count or worker count)
    InvalidLayout,

    /// The push replication loop is not running
    NotRunning,

    /// Configuration error
    ConfigurationError,
}

impl ReplicationError {
    /// Create a new replication error.
    pub fn new(kind: ReplicationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create an invalid layout error.
    pub fn invalid_layout(message: impl Into<String>) -> Self {
        Self::new(ReplicationErrorKind::InvalidLayout, message)
    }

    /// Create a not running error.
    pub fn not_running(message: impl Into<String>) -> Self {
        Self::new(ReplicationErrorKind::NotRunning, message)
    }

    /// Create a configuration error.
    pub fn configuration_error(message: impl Into<String>) -> Self {
        Self::new(ReplicationErrorKind::ConfigurationError, message)
    }
}

/// Result type for replication operations
pub type ReplicationResult<T> = Result<T, ReplicationError>;
