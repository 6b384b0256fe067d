//! Agent registry error types.

use thiserror::Error;

/// Errors that can occur while reading agent manifests.
#[derive(Debug, Error)]
pub enum AgentError {
    /// A manifest file could not be read.
    #[error("io error on {path}: {source}")]
    Io {
        /// The manifest path.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A manifest file is not a valid agent definition.
    #[error("invalid manifest {path}: {message}")]
    Parse {
        /// The manifest path.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
