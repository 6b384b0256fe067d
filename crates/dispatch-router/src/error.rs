//! Router error types.

use thiserror::Error;

/// Errors the router surfaces to CLI callers.
///
/// Hook callers never see these: the hook path converts every failure
/// into an `Escalate` decision with a diagnostic reason.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The request text failed validation.
    #[error("invalid request: {reason}")]
    InputInvalid {
        /// What was wrong with the input.
        reason: String,
    },
}

/// Result type for router operations.
pub type RouterResult<T> = Result<T, RouterError>;
