//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_router::prelude::*;` to import all essential types.

// Errors
pub use crate::{RouterError, RouterResult};

// Decisions
pub use crate::{Decision, RoutingDecision};

// The pipeline
pub use crate::{MAX_REQUEST_LEN, Router, checklist};

// Matchers
pub use crate::{AgentMatch, KeywordMatcher, SEMANTIC_MATCHER_ENV, SemanticMatcher};

// Cache
pub use crate::{CacheEntry, RouteCache};
