//! Event-log error types.

use thiserror::Error;

/// Errors that can occur while appending to or reading the event log.
#[derive(Debug, Error)]
pub enum EventError {
    /// The sidecar lock could not be acquired within the bounded wait.
    #[error("timed out waiting for lock on {path}")]
    LockTimeout {
        /// The lock file that stayed busy.
        path: String,
    },

    /// A filesystem operation failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// The path the operation touched.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialised.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for event-log operations.
pub type EventResult<T> = Result<T, EventError>;
