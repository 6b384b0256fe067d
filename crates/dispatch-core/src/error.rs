//! Core error types.

use thiserror::Error;

/// Errors that can occur in the core substrate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The user's home directory could not be determined.
    #[error("cannot determine home directory (neither DISPATCH_DATA_DIR nor a home directory is available)")]
    NoHomeDir,

    /// A filesystem operation failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// The path the operation touched.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file exists but could not be parsed.
    #[error("failed to parse {path}: {message}")]
    ConfigParse {
        /// The offending file.
        path: String,
        /// Parser diagnostic.
        message: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
