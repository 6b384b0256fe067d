//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_agents::prelude::*;` to import all essential types.

// Errors
pub use crate::{AgentError, AgentResult};

// Definitions and registry
pub use crate::{AgentDefinition, AgentRegistry, ModelTier};
