//! Dispatch Queue - Work-in-progress coordination.
//!
//! This crate provides:
//! - Work items with priorities, dependencies, and a monotone status
//!   machine (`queued → in_progress → completed | failed`)
//! - A WIP-limited queue persisted per project at `state/work-queue.json`
//! - Atomic load-modify-store under an exclusive lock, published via
//!   temp-file-plus-rename
//! - Adaptive WIP tuning from completion and stall rates
//!
//! # Invariants
//!
//! Enforced on every mutation, with invalid requests rejected and the
//! persisted state left untouched:
//! - at most `wip_limit` items are in progress
//! - an item with unsatisfied dependencies never starts
//! - status transitions are monotone; there is no way back to `queued`

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod item;
mod queue;

pub use error::{QueueError, QueueResult};
pub use item::{WorkItem, WorkStatus};
pub use queue::{QUEUE_FILE, WipRates, WorkQueue, WorkQueueState};
