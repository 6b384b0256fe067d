//! Dispatch Hooks - Host lifecycle integration.
//!
//! This crate provides:
//! - The six lifecycle hooks the host invokes (`prompt-submit`,
//!   `agent-start`, `agent-stop`, `session-start`, `session-end`,
//!   `pre-tool-use`)
//! - The compliance tracker joining agent invocations to routing
//!   recommendations over a temporal window
//! - Session flags (one-shot booleans scoped to a session)
//! - The context threshold monitor
//!
//! # Contract with the host
//!
//! A hook reads one JSON object on stdin, writes advisory output for the
//! host on stdout (framed in literal delimiters such as
//! `<routing-recommendation>…</routing-recommendation>`), writes
//! user-visible diagnostics on stderr, and reports success regardless of
//! what went wrong internally: the worst outcome of a Dispatch failure is
//! a missing recommendation or a missing event, never a blocked host.
//! Everything here is synchronous and bounded — stdin, lock waits, the
//! optional matcher timeout, and filesystem I/O are the only suspension
//! points.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod agent;
mod compliance;
mod context;
mod dispatcher;
mod flags;
mod input;
mod prompt_submit;
mod session;
mod tool;

pub use compliance::{COMPLIANCE_WINDOW_SECS, TAIL_SCAN};
pub use context::{CONTEXT_WINDOW_TOKENS, TOKENS_PER_TURN, WARN_FRACTION};
pub use dispatcher::{HookOutcome, HookRuntime};
pub use flags::SessionFlags;
pub use input::HookInput;
