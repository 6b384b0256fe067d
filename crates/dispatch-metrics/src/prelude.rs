//! Prelude module - commonly used types for convenient import.
//!
//! Use `use dispatch_metrics::prelude::*;` to import all essential types.

// Errors
pub use crate::{MetricsError, MetricsResult};

// Aggregation
pub use crate::{completion_rate, compliance_report, daily_report, weekly_report};

// Reports
pub use crate::{ComplianceCounts, ComplianceReport, DailyReport, WeeklyReport};

// Cleanup
pub use crate::{CleanupOutcome, cleanup};
