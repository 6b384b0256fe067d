//! Per-day JSONL event files.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use dispatch_core::FileLock;
use tracing::warn;

use crate::error::{EventError, EventResult};
use crate::event::Event;

/// Default bounded wait for the sidecar lock.
pub const LOCK_WAIT: Duration = Duration::from_secs(5);

/// Extension of daily log files.
const FILE_EXT: &str = "jsonl";

/// Map a lock acquisition failure onto the event error taxonomy.
fn lock_err(path: &Path, e: std::io::Error) -> EventError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        EventError::LockTimeout {
            path: path.display().to_string(),
        }
    } else {
        EventError::Io {
            path: path.display().to_string(),
            source: e,
        }
    }
}

/// An append-only event log for one project.
///
/// Records land in `<metrics_dir>/YYYY-MM-DD.jsonl`, one JSON object per
/// line, coordinated through `.lock` sidecars.
#[derive(Debug, Clone)]
pub struct EventLog {
    dir: PathBuf,
}

impl EventLog {
    /// Open the log rooted at a project's `metrics/` directory.
    ///
    /// The directory is expected to exist (created by the data-root
    /// scaffolding); nothing is touched until the first append.
    #[must_use]
    pub fn new(metrics_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: metrics_dir.into(),
        }
    }

    /// Path of the daily file for `date`.
    #[must_use]
    pub fn day_path(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.{FILE_EXT}", date.format("%Y-%m-%d")))
    }

    /// Append one record to the daily file named by its timestamp.
    ///
    /// The record is serialised to a single line before the exclusive
    /// sidecar lock is taken, then written with one `write_all`, so
    /// concurrent writers interleave whole lines, never fragments.
    ///
    /// # Errors
    ///
    /// [`EventError::LockTimeout`] after the bounded wait,
    /// [`EventError::Io`] on filesystem failures, [`EventError::Serialize`]
    /// if the record cannot be serialised. Callers in hooks are expected to
    /// warn and carry on: losing one event must not fail the host.
    pub fn append(&self, event: &Event) -> EventResult<()> {
        let mut line = serde_json::to_string(event)?;
        line.push('\n');

        let path = self.day_path(event.timestamp().date_naive());
        let sidecar = lock_path(&path);
        let _lock = FileLock::exclusive(&sidecar, LOCK_WAIT).map_err(|e| lock_err(&sidecar, e))?;

        // Transient I/O gets one retry before the event is given up on.
        if let Err(first) = write_line(&path, &line) {
            warn!(path = %path.display(), error = %first, "append failed, retrying once");
            return write_line(&path, &line).map_err(|source| EventError::Io {
                path: path.display().to_string(),
                source,
            });
        }
        Ok(())
    }

    /// All parseable records for one day, in insertion order.
    ///
    /// Malformed and unrecognised lines are skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`EventError::LockTimeout`] / [`EventError::Io`] when the file
    /// exists but cannot be read under a shared lock. A missing file is an
    /// empty day, not an error.
    pub fn read_day(&self, date: NaiveDate) -> EventResult<Vec<Event>> {
        let path = self.day_path(date);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let sidecar = lock_path(&path);
        let _lock = FileLock::shared(&sidecar, LOCK_WAIT).map_err(|e| lock_err(&sidecar, e))?;

        let content = std::fs::read_to_string(&path).map_err(|source| EventError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(parse_lines(&path, &content))
    }

    /// All parseable records with dates in `[since, until]`, ascending by
    /// file date.
    ///
    /// # Errors
    ///
    /// Propagates the first per-day failure; days before it are lost to
    /// the caller, so callers preferring best-effort should iterate days
    /// themselves.
    pub fn read_range(&self, since: NaiveDate, until: NaiveDate) -> EventResult<Vec<Event>> {
        let mut events = Vec::new();
        let mut date = since;
        while date <= until {
            events.extend(self.read_day(date)?);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        Ok(events)
    }

    /// The last `n` parseable records of one day.
    ///
    /// Reads only the tail of the file, so scanning today's log on every
    /// agent start stays cheap even late in a busy day.
    ///
    /// # Errors
    ///
    /// Same as [`EventLog::read_day`].
    pub fn read_tail(&self, date: NaiveDate, n: usize) -> EventResult<Vec<Event>> {
        let path = self.day_path(date);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let sidecar = lock_path(&path);
        let _lock = FileLock::shared(&sidecar, LOCK_WAIT).map_err(|e| lock_err(&sidecar, e))?;

        let content = std::fs::read_to_string(&path).map_err(|source| EventError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tail_start = {
            let mut newlines_seen = 0usize;
            let mut start = 0usize;
            for (i, b) in content.bytes().enumerate().rev() {
                if b == b'\n' && i + 1 < content.len() {
                    newlines_seen += 1;
                    if newlines_seen >= n {
                        start = i + 1;
                        break;
                    }
                }
            }
            start
        };
        Ok(parse_lines(&path, &content[tail_start..]))
    }

    /// Daily files whose date is strictly older than
    /// `today - retention_days`, for the cleanup command.
    ///
    /// Only files matching the `YYYY-MM-DD.jsonl` pattern qualify; lock
    /// sidecars ride along with their data file.
    #[must_use]
    pub fn expired_files(&self, retention_days: u32, today: NaiveDate) -> Vec<PathBuf> {
        let cutoff = today - chrono::Days::new(u64::from(retention_days));
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut expired = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(date) = file_date(&path) else {
                continue;
            };
            if date < cutoff {
                let sidecar = lock_path(&path);
                expired.push(path);
                if sidecar.exists() {
                    expired.push(sidecar);
                }
            }
        }
        expired.sort();
        expired
    }
}

/// Date encoded in a daily file name, if it is one.
fn file_date(path: &Path) -> Option<NaiveDate> {
    if path.extension()? != FILE_EXT {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

fn lock_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

fn write_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?.write_all(line.as_bytes())
}

/// Parse whole lines, skipping anything malformed or unrecognised.
fn parse_lines(path: &Path, content: &str) -> Vec<Event> {
    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Event>(line) {
            Ok(event) => events.push(event),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = idx + 1,
                    error = %e,
                    "skipping unreadable event record"
                );
            },
        }
    }
    events
}
