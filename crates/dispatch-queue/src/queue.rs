//! The persisted, WIP-limited queue.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use dispatch_core::FileLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{QueueError, QueueResult};
use crate::item::{WorkItem, WorkStatus};

/// File name of the persisted queue state, under `state/`.
pub const QUEUE_FILE: &str = "work-queue.json";

/// Bounded wait for the queue lock.
const QUEUE_LOCK_WAIT: Duration = Duration::from_secs(5);

/// Grace period before an orphaned temp file is swept.
const TEMP_GRACE: Duration = Duration::from_secs(60);

/// The persisted queue document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkQueueState {
    /// Maximum concurrently in-progress items.
    pub wip_limit: usize,
    /// Items in progress.
    pub active: Vec<WorkItem>,
    /// Items waiting.
    pub queued: Vec<WorkItem>,
    /// Ids of completed items, kept for dependency resolution.
    pub completed_ids: Vec<String>,
}

impl Default for WorkQueueState {
    fn default() -> Self {
        Self {
            wip_limit: 3,
            active: Vec::new(),
            queued: Vec::new(),
            completed_ids: Vec::new(),
        }
    }
}

impl WorkQueueState {
    /// Share of active items older than an hour; `0.0` when idle.
    #[must_use]
    pub fn stall_rate(&self, now: DateTime<FixedOffset>) -> f64 {
        if self.active.is_empty() {
            return 0.0;
        }
        let stalled = self
            .active
            .iter()
            .filter(|item| {
                item.age_at(now)
                    .is_some_and(|age| age > chrono::Duration::hours(1))
            })
            .count();
        #[allow(clippy::cast_precision_loss)]
        {
            stalled as f64 / self.active.len() as f64
        }
    }

    /// Whether every dependency of `item` has completed.
    #[must_use]
    pub fn dependencies_satisfied(&self, item: &WorkItem) -> bool {
        item.dependencies
            .iter()
            .all(|dep| self.completed_ids.contains(dep))
    }

    fn find_queued(&self, id: &str) -> Option<&WorkItem> {
        self.queued.iter().find(|i| i.id == id)
    }
}

/// Observed throughput, fed into the adaptive WIP rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WipRates {
    /// Completed items per hour over the last day.
    pub completion_rate: f64,
    /// Share of active items older than an hour.
    pub stall_rate: f64,
}

impl WipRates {
    /// The WIP limit these rates call for: stalling work shrinks the
    /// limit to 1, a fast clean queue widens it to 4, everything else
    /// sits at the default 3.
    #[must_use]
    pub fn recommended_limit(self) -> usize {
        if self.stall_rate > 0.30 {
            1
        } else if self.completion_rate > 2.0 && self.stall_rate < 0.10 {
            4
        } else {
            3
        }
    }
}

/// The per-project work queue.
///
/// Every operation is load-modify-store under an exclusive sidecar lock,
/// published with temp-file-plus-rename. A mutation that violates an
/// invariant is rejected before the store, leaving the persisted state
/// untouched.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    path: PathBuf,
}

impl WorkQueue {
    /// The queue persisted in `state_dir`.
    #[must_use]
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(QUEUE_FILE),
        }
    }

    /// Add a new item to the queue.
    ///
    /// The item enters as `queued` regardless of its incoming status.
    ///
    /// # Errors
    ///
    /// [`QueueError::NotFound`] never; [`QueueError::InvalidTransition`]
    /// when the id is already present; lock/state errors as usual.
    pub fn enqueue(&self, mut item: WorkItem) -> QueueResult<WorkItem> {
        self.with_state(|state| {
            let exists = state.active.iter().any(|i| i.id == item.id)
                || state.find_queued(&item.id).is_some()
                || state.completed_ids.contains(&item.id);
            if exists {
                return Err(QueueError::InvalidTransition {
                    id: item.id.clone(),
                    from: WorkStatus::Queued,
                    to: WorkStatus::Queued,
                });
            }
            item.status = WorkStatus::Queued;
            state.queued.push(item.clone());
            debug!(id = %item.id, "enqueued work item");
            Ok(item)
        })
    }

    /// Start the best eligible item, if capacity allows.
    ///
    /// Selection: highest priority among queued items whose dependencies
    /// have all completed; ties favour the item that unblocks the most
    /// queued dependents, then insertion order. Returns `None` when the
    /// WIP limit is reached or nothing is eligible.
    ///
    /// # Errors
    ///
    /// Lock/state errors as usual; never a transition error.
    pub fn start_next(&self, now: DateTime<FixedOffset>) -> QueueResult<Option<WorkItem>> {
        self.with_state(|state| {
            if state.active.len() >= state.wip_limit {
                debug!(wip_limit = state.wip_limit, "WIP limit reached");
                return Ok(None);
            }

            let mut best: Option<(usize, i64, usize)> = None;
            for (idx, item) in state.queued.iter().enumerate() {
                if !state.dependencies_satisfied(item) {
                    continue;
                }
                let unblocks = state
                    .queued
                    .iter()
                    .filter(|other| other.dependencies.contains(&item.id))
                    .count();
                let better = match best {
                    None => true,
                    Some((_, best_priority, best_unblocks)) => {
                        item.priority > best_priority
                            || (item.priority == best_priority && unblocks > best_unblocks)
                    },
                };
                if better {
                    best = Some((idx, item.priority, unblocks));
                }
            }

            let Some((idx, _, _)) = best else {
                return Ok(None);
            };
            let mut item = state.queued.remove(idx);
            item.status = WorkStatus::InProgress;
            item.started_at = Some(now);
            state.active.push(item.clone());
            Ok(Some(item))
        })
    }

    /// Mark an active item completed.
    ///
    /// # Errors
    ///
    /// [`QueueError::NotFound`] for an unknown id,
    /// [`QueueError::InvalidTransition`] when the item is not in
    /// progress.
    pub fn complete(&self, id: &str, now: DateTime<FixedOffset>) -> QueueResult<WorkItem> {
        self.finish(id, WorkStatus::Completed, None, now)
    }

    /// Mark an active item failed.
    ///
    /// Failed ids do not enter `completed_ids`: work depending on them
    /// stays blocked until re-planned.
    ///
    /// # Errors
    ///
    /// Same as [`WorkQueue::complete`].
    pub fn fail(
        &self,
        id: &str,
        reason: Option<String>,
        now: DateTime<FixedOffset>,
    ) -> QueueResult<WorkItem> {
        self.finish(id, WorkStatus::Failed, reason, now)
    }

    /// The current persisted state, read under a shared lock.
    ///
    /// # Errors
    ///
    /// Lock/state errors as usual.
    pub fn status(&self) -> QueueResult<WorkQueueState> {
        let _lock = self.shared_lock()?;
        self.load()
    }

    /// Apply the adaptive WIP rule and persist the new limit.
    ///
    /// The stall rate comes from the live state; the completion rate is
    /// the caller's (it needs event-log history this crate does not own).
    /// Returns the limit now in force.
    ///
    /// # Errors
    ///
    /// Lock/state errors as usual.
    pub fn adjust_wip(
        &self,
        completion_rate: f64,
        now: DateTime<FixedOffset>,
    ) -> QueueResult<usize> {
        self.with_state(|state| {
            let rates = WipRates {
                completion_rate,
                stall_rate: state.stall_rate(now),
            };
            let limit = rates.recommended_limit();
            if limit != state.wip_limit {
                debug!(
                    from = state.wip_limit,
                    to = limit,
                    completion_rate,
                    stall_rate = rates.stall_rate,
                    "adjusting WIP limit"
                );
            }
            state.wip_limit = limit;
            Ok(limit)
        })
    }

    fn finish(
        &self,
        id: &str,
        to: WorkStatus,
        reason: Option<String>,
        now: DateTime<FixedOffset>,
    ) -> QueueResult<WorkItem> {
        self.with_state(|state| {
            let Some(idx) = state.active.iter().position(|i| i.id == id) else {
                // Not active. Distinguish a bad transition from a typo.
                if let Some(item) = state.find_queued(id) {
                    return Err(QueueError::InvalidTransition {
                        id: id.to_string(),
                        from: item.status,
                        to,
                    });
                }
                if state.completed_ids.iter().any(|c| c == id) {
                    return Err(QueueError::InvalidTransition {
                        id: id.to_string(),
                        from: WorkStatus::Completed,
                        to,
                    });
                }
                return Err(QueueError::NotFound { id: id.to_string() });
            };

            let mut item = state.active.remove(idx);
            item.status = to;
            item.completed_at = Some(now);
            item.failure_reason = reason;
            if to == WorkStatus::Completed {
                state.completed_ids.push(item.id.clone());
            }
            Ok(item)
        })
    }

    /// Exclusive-locked load-modify-store. The callback's error leaves
    /// the persisted state untouched.
    fn with_state<R>(
        &self,
        mutate: impl FnOnce(&mut WorkQueueState) -> QueueResult<R>,
    ) -> QueueResult<R> {
        let lock_path = self.lock_path();
        let _lock =
            FileLock::exclusive(&lock_path, QUEUE_LOCK_WAIT).map_err(|e| lock_err(&lock_path, e))?;

        let mut state = self.load()?;
        let result = mutate(&mut state)?;
        self.save(&state)?;
        Ok(result)
    }

    fn shared_lock(&self) -> QueueResult<FileLock> {
        let lock_path = self.lock_path();
        FileLock::shared(&lock_path, QUEUE_LOCK_WAIT).map_err(|e| lock_err(&lock_path, e))
    }

    fn load(&self) -> QueueResult<WorkQueueState> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(WorkQueueState::default());
            },
            Err(source) => {
                return Err(QueueError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            },
        };
        serde_json::from_str(&content).map_err(|e| QueueError::CorruptState {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Serialise to a uniquely named sibling temp file (mode `0600`),
    /// then rename over the state file. Sweeps orphaned temp files older
    /// than the grace period while it is here.
    fn save(&self, state: &WorkQueueState) -> QueueResult<()> {
        self.sweep_stale_temps();

        let json = serde_json::to_string_pretty(state).map_err(|e| QueueError::CorruptState {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;

        let tmp = self.temp_path();
        {
            let mut options = std::fs::OpenOptions::new();
            options.create_new(true).write(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp).map_err(|source| QueueError::Io {
                path: tmp.display().to_string(),
                source,
            })?;
            file.write_all(json.as_bytes())
                .map_err(|source| QueueError::Io {
                    path: tmp.display().to_string(),
                    source,
                })?;
        }
        std::fs::rename(&tmp, &self.path).map_err(|source| QueueError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Temp files left by a writer the host killed mid-save are
    /// unreachable (unique names); remove any older than the grace
    /// period.
    fn sweep_stale_temps(&self) {
        let Some(dir) = self.path.parent() else {
            return;
        };
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !(name.starts_with(&format!(".{QUEUE_FILE}.")) && name.ends_with(".tmp")) {
                continue;
            }
            let stale = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())
                .is_some_and(|age| age > TEMP_GRACE);
            if stale {
                warn!(path = %path.display(), "removing orphaned queue temp file");
                let _ = std::fs::remove_file(&path);
            }
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_owned();
        os.push(".lock");
        PathBuf::from(os)
    }

    fn temp_path(&self) -> PathBuf {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(format!(".{QUEUE_FILE}.{}.tmp", uuid::Uuid::new_v4()))
    }
}

fn lock_err(path: &Path, e: std::io::Error) -> QueueError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        QueueError::LockTimeout {
            path: path.display().to_string(),
        }
    } else {
        QueueError::Io {
            path: path.display().to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<FixedOffset> {
        chrono::Local::now().fixed_offset()
    }

    fn queue() -> (tempfile::TempDir, WorkQueue) {
        let dir = tempfile::tempdir().unwrap();
        let queue = WorkQueue::new(dir.path());
        (dir, queue)
    }

    #[test]
    fn test_enqueue_and_status() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("w-1", "first")).unwrap();
        queue.enqueue(WorkItem::new("w-2", "second")).unwrap();

        let state = queue.status().unwrap();
        assert_eq!(state.queued.len(), 2);
        assert!(state.active.is_empty());
        assert_eq!(state.wip_limit, 3);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("w-1", "first")).unwrap();
        assert!(matches!(
            queue.enqueue(WorkItem::new("w-1", "again")),
            Err(QueueError::InvalidTransition { .. })
        ));
        // The rejected mutation left the state untouched.
        assert_eq!(queue.status().unwrap().queued.len(), 1);
    }

    #[test]
    fn test_start_next_highest_priority() {
        let (_dir, queue) = queue();
        queue
            .enqueue(WorkItem::new("low", "later").with_priority(1))
            .unwrap();
        queue
            .enqueue(WorkItem::new("high", "now").with_priority(9))
            .unwrap();

        let started = queue.start_next(now()).unwrap().unwrap();
        assert_eq!(started.id, "high");
        assert_eq!(started.status, WorkStatus::InProgress);
        assert!(started.started_at.is_some());
    }

    #[test]
    fn test_start_next_respects_wip_limit() {
        let (_dir, queue) = queue();
        for i in 0..5 {
            queue.enqueue(WorkItem::new(format!("w-{i}"), "work")).unwrap();
        }
        for _ in 0..3 {
            assert!(queue.start_next(now()).unwrap().is_some());
        }
        // Limit 3 reached.
        assert!(queue.start_next(now()).unwrap().is_none());
        let state = queue.status().unwrap();
        assert_eq!(state.active.len(), 3);
        assert!(state.active.len() <= state.wip_limit);
    }

    #[test]
    fn test_dependencies_gate_start() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("base", "foundation")).unwrap();
        queue
            .enqueue(
                WorkItem::new("roof", "needs base")
                    .with_priority(100)
                    .with_dependencies(vec!["base".to_string()]),
            )
            .unwrap();

        // Despite its priority, "roof" cannot start before "base" completes.
        let first = queue.start_next(now()).unwrap().unwrap();
        assert_eq!(first.id, "base");
        assert!(queue.start_next(now()).unwrap().is_none());

        queue.complete("base", now()).unwrap();
        let second = queue.start_next(now()).unwrap().unwrap();
        assert_eq!(second.id, "roof");
    }

    #[test]
    fn test_tiebreak_favours_unblocking() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("a", "no dependents")).unwrap();
        queue.enqueue(WorkItem::new("b", "two dependents")).unwrap();
        queue
            .enqueue(WorkItem::new("c", "").with_dependencies(vec!["b".to_string()]))
            .unwrap();
        queue
            .enqueue(WorkItem::new("d", "").with_dependencies(vec!["b".to_string()]))
            .unwrap();

        let started = queue.start_next(now()).unwrap().unwrap();
        assert_eq!(started.id, "b");
    }

    #[test]
    fn test_complete_moves_to_completed_ids() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("w-1", "work")).unwrap();
        queue.start_next(now()).unwrap();
        let done = queue.complete("w-1", now()).unwrap();
        assert_eq!(done.status, WorkStatus::Completed);
        assert!(done.completed_at.is_some());

        let state = queue.status().unwrap();
        assert!(state.active.is_empty());
        assert_eq!(state.completed_ids, vec!["w-1"]);
    }

    #[test]
    fn test_fail_does_not_satisfy_dependents() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("base", "will fail")).unwrap();
        queue
            .enqueue(WorkItem::new("dep", "").with_dependencies(vec!["base".to_string()]))
            .unwrap();
        queue.start_next(now()).unwrap();
        let failed = queue
            .fail("base", Some("exploded".to_string()), now())
            .unwrap();
        assert_eq!(failed.status, WorkStatus::Failed);
        assert_eq!(failed.failure_reason.as_deref(), Some("exploded"));

        let state = queue.status().unwrap();
        assert!(state.completed_ids.is_empty());
        assert!(queue.start_next(now()).unwrap().is_none());
    }

    #[test]
    fn test_complete_queued_item_rejected() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("w-1", "still queued")).unwrap();
        let err = queue.complete("w-1", now()).unwrap_err();
        assert!(matches!(
            err,
            QueueError::InvalidTransition {
                from: WorkStatus::Queued,
                to: WorkStatus::Completed,
                ..
            }
        ));
        // State untouched.
        assert_eq!(queue.status().unwrap().queued.len(), 1);
    }

    #[test]
    fn test_complete_twice_rejected() {
        let (_dir, queue) = queue();
        queue.enqueue(WorkItem::new("w-1", "work")).unwrap();
        queue.start_next(now()).unwrap();
        queue.complete("w-1", now()).unwrap();
        assert!(matches!(
            queue.complete("w-1", now()),
            Err(QueueError::InvalidTransition {
                from: WorkStatus::Completed,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_id_not_found() {
        let (_dir, queue) = queue();
        assert!(matches!(
            queue.complete("ghost", now()),
            Err(QueueError::NotFound { .. })
        ));
    }

    #[test]
    fn test_state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let queue = WorkQueue::new(dir.path());
            queue.enqueue(WorkItem::new("w-1", "persisted")).unwrap();
        }
        let queue = WorkQueue::new(dir.path());
        let state = queue.status().unwrap();
        assert_eq!(state.queued[0].description, "persisted");
    }

    #[test]
    fn test_corrupt_state_rejected_not_clobbered() {
        let dir = tempfile::tempdir().unwrap();
        let queue = WorkQueue::new(dir.path());
        std::fs::write(dir.path().join(QUEUE_FILE), "{broken").unwrap();

        assert!(matches!(
            queue.enqueue(WorkItem::new("w-1", "x")),
            Err(QueueError::CorruptState { .. })
        ));
        // The corrupt file is still there for diagnosis.
        let content = std::fs::read_to_string(dir.path().join(QUEUE_FILE)).unwrap();
        assert_eq!(content, "{broken");
    }

    #[test]
    fn test_wip_rates_rule() {
        let stall = WipRates {
            completion_rate: 5.0,
            stall_rate: 0.5,
        };
        assert_eq!(stall.recommended_limit(), 1);

        let fast = WipRates {
            completion_rate: 2.5,
            stall_rate: 0.0,
        };
        assert_eq!(fast.recommended_limit(), 4);

        let steady = WipRates {
            completion_rate: 1.0,
            stall_rate: 0.2,
        };
        assert_eq!(steady.recommended_limit(), 3);
    }

    #[test]
    fn test_adjust_wip_persists() {
        let (_dir, queue) = queue();
        let limit = queue.adjust_wip(3.0, now()).unwrap();
        assert_eq!(limit, 4);
        assert_eq!(queue.status().unwrap().wip_limit, 4);
    }

    #[test]
    fn test_state_round_trip() {
        let state = WorkQueueState {
            wip_limit: 2,
            active: vec![WorkItem::new("a", "active")],
            queued: vec![WorkItem::new("q", "queued")],
            completed_ids: vec!["done".to_string()],
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: WorkQueueState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
