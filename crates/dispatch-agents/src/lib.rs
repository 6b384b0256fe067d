//! Dispatch Agents - Agent manifests and registry.
//!
//! This crate provides:
//! - The agent manifest format (id, model tier, description, keywords)
//! - Registry loading from user-level and project-level manifest
//!   directories, later directories overriding earlier ones
//! - Model-tier lookup with an explicit `unknown` tier for unregistered
//!   agent types
//!
//! Agents themselves are opaque LLM workers owned by the host; Dispatch
//! only ever reads their manifests. A manifest is one YAML file:
//!
//! ```yaml
//! id: haiku-general
//! model_tier: haiku
//! description: Small mechanical edits with an explicit target
//! keywords: [typo, fix, rename, whitespace]
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod definition;
mod error;
mod registry;

pub use definition::{AgentDefinition, ModelTier};
pub use error::{AgentError, AgentResult};
pub use registry::AgentRegistry;
