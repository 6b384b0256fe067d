//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_events::prelude::*;` to import all essential types.

// Errors
pub use crate::{EventError, EventResult};

// Event model
pub use crate::{ActualHandler, AgentLifecycle, ComplianceStatus, Event, Recommendation, now};

// Log
pub use crate::{EventLog, LOCK_WAIT};
