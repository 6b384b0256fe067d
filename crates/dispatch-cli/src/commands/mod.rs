//! Command implementations.
//!
//! Each command returns its process exit code; errors are printed to
//! stderr before returning.

pub(crate) mod hook;
pub(crate) mod metrics;
pub(crate) mod route;
pub(crate) mod validate;
pub(crate) mod work;
