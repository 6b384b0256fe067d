//! Dispatch Events - Append-only per-project event logging.
//!
//! This crate provides:
//! - The `record_type`-tagged event model (routing recommendations,
//!   request tracking, agent lifecycle, free-form metrics)
//! - Per-day JSONL files under a project's `metrics/` directory
//! - Advisory sidecar locking: exclusive for appends (bounded wait),
//!   shared for reads
//! - Retention eligibility for the cleanup command
//!
//! # Consistency Model
//!
//! Every record is serialised to a single line before the lock is taken
//! and written with one `write_all`, so a reader never observes a partial
//! record: either the whole line is in the file or none of it is. Within a
//! daily file, append order is lock-acquisition order. There is no
//! ordering guarantee across files beyond the date in the name.
//!
//! Readers skip malformed or unrecognised lines with a warning rather
//! than rejecting the file; a corrupt record costs one event, not a day
//! of history.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod event;
mod log;

pub use error::{EventError, EventResult};
pub use event::{ActualHandler, AgentLifecycle, ComplianceStatus, Event, Recommendation, now};
pub use log::{EventLog, LOCK_WAIT};
