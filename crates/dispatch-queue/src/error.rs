//! Work queue error types.

use thiserror::Error;

use crate::item::WorkStatus;

/// Errors that can occur while operating the work queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// No item with the given id.
    #[error("no work item with id {id}")]
    NotFound {
        /// The id that was requested.
        id: String,
    },

    /// A status transition outside the monotone state machine.
    #[error("invalid transition for {id}: {from} → {to}")]
    InvalidTransition {
        /// The item whose transition was rejected.
        id: String,
        /// Current status.
        from: WorkStatus,
        /// Requested status.
        to: WorkStatus,
    },

    /// The persisted state file exists but cannot be parsed.
    #[error("corrupted queue state at {path}: {message}")]
    CorruptState {
        /// The state file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// The state lock could not be acquired within the bounded wait.
    #[error("timed out waiting for queue lock at {path}")]
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
}

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;
