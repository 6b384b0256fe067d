//! Dispatch Router - The routing decision engine.
//!
//! This crate provides:
//! - `route(request) → RoutingDecision`: a two-stage mechanical-then-
//!   semantic classifier with an auditable reason and a confidence score
//! - The mechanical escalation checklist (complexity signals, bulk
//!   destructive operations, pathless file operations, agent-definition
//!   edits, multiple objectives, creation/design work, meta-requests)
//! - The keyword matcher (always available) and the pluggable external
//!   semantic matcher with a bounded timeout and documented fallback
//! - A per-project route cache keyed on request text and dependency
//!   mtimes
//!
//! # Determinism
//!
//! Given the same request, configuration, and registry, `route` returns
//! the same decision. The semantic matcher is the single admitted source
//! of non-determinism, and it is contained: any failure (timeout,
//! non-zero exit, malformed JSON, unknown agent id) falls back to the
//! keyword matcher with the cause logged and recorded in the decision
//! reason.
//!
//! The router never panics and never propagates errors to hook callers;
//! every failure becomes an `Escalate` decision with a diagnostic reason.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cache;
mod decision;
mod error;
mod matcher;
mod router;
mod semantic;
mod triggers;

pub use cache::{CacheEntry, RouteCache};
pub use decision::{Decision, RoutingDecision};
pub use error::{RouterError, RouterResult};
pub use matcher::{AgentMatch, KeywordMatcher};
pub use router::{MAX_REQUEST_LEN, Router};
pub use semantic::{SEMANTIC_MATCHER_ENV, SemanticMatcher};
pub use triggers::checklist;
