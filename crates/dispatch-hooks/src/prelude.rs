//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_hooks::prelude::*;` to import all essential types.

// Runtime
pub use crate::{HookInput, HookOutcome, HookRuntime};

// Session flags
pub use crate::SessionFlags;

// Tuning constants
pub use crate::{
    COMPLIANCE_WINDOW_SECS, CONTEXT_WINDOW_TOKENS, TAIL_SCAN, TOKENS_PER_TURN, WARN_FRACTION,
};
