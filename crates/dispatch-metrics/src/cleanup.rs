//! Retention cleanup.

use std::path::PathBuf;

use chrono::NaiveDate;
use dispatch_events::EventLog;
use tracing::{info, warn};

use crate::error::MetricsResult;

/// What a cleanup run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    /// Daily files (and their lock sidecars) that were deleted.
    pub removed: Vec<PathBuf>,
    /// Files that were eligible but could not be deleted.
    pub failed: Vec<PathBuf>,
}

/// Delete daily event files older than `retention_days`.
///
/// Operates only on `YYYY-MM-DD.jsonl` files (plus their `.lock`
/// sidecars) in the project's `metrics/` directory; state, memory, and
/// cache trees are never touched. Idempotent: a second run over the same
/// directory removes nothing further.
///
/// # Errors
///
/// Never fails outright; per-file deletion failures are recorded in the
/// outcome and logged.
pub fn cleanup(
    log: &EventLog,
    retention_days: u32,
    today: NaiveDate,
) -> MetricsResult<CleanupOutcome> {
    let mut outcome = CleanupOutcome::default();
    for path in log.expired_files(retention_days, today) {
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "removed expired daily file");
                outcome.removed.push(path);
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove expired daily file");
                outcome.failed.push(path);
            },
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_removes_expired_only() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        std::fs::write(dir.path().join("2024-01-01.jsonl"), "").unwrap();
        std::fs::write(dir.path().join("2024-01-01.jsonl.lock"), "").unwrap();
        std::fs::write(dir.path().join("2024-05-30.jsonl"), "").unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let outcome = cleanup(&log, 90, today).unwrap();
        assert_eq!(outcome.removed.len(), 2);
        assert!(outcome.failed.is_empty());
        assert!(!dir.path().join("2024-01-01.jsonl").exists());
        assert!(dir.path().join("2024-05-30.jsonl").exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        std::fs::write(dir.path().join("2024-01-01.jsonl"), "").unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let first = cleanup(&log, 90, today).unwrap();
        assert_eq!(first.removed.len(), 1);
        let second = cleanup(&log, 90, today).unwrap();
        assert!(second.removed.is_empty());
    }

    #[test]
    fn test_cleanup_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();
        std::fs::write(dir.path().join("work-queue.json"), "{}").unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let outcome = cleanup(&log, 0, today).unwrap();
        assert!(outcome.removed.is_empty());
        assert!(dir.path().join("notes.txt").exists());
        assert!(dir.path().join("work-queue.json").exists());
    }
}
