//! Metrics error types.

use thiserror::Error;

/// Errors that can occur while aggregating or cleaning the event log.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Reading the event log failed.
    #[error(transparent)]
    Events(#[from] dispatch_events::EventError),

    /// An invalid date range or ISO week was requested.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// A filesystem operation failed during cleanup.
    #[error("io error on {path}: {source}")]
    Io {
        /// The path the operation touched.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;
