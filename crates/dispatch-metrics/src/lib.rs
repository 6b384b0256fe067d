//! Dispatch Metrics - Reports over the event log.
//!
//! This crate provides:
//! - Daily, weekly, and compliance reports folded from a project's daily
//!   event files
//! - Retention cleanup for expired daily files
//!
//! Reports are pure functions of the event log; no aggregate is ever
//! persisted, so a report can always be recomputed and two runs over the
//! same log agree. Cleanup touches only `metrics/` daily files — state,
//! memory, and cache directories are never its business.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod aggregate;
mod cleanup;
mod error;
mod report;

pub use aggregate::{completion_rate, compliance_report, daily_report, weekly_report};
pub use cleanup::{CleanupOutcome, cleanup};
pub use error::{MetricsError, MetricsResult};
pub use report::{ComplianceCounts, ComplianceReport, DailyReport, WeeklyReport};
