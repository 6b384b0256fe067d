//! Session-scoped one-shot flags.
//!
//! A small JSON document at `state/session-flags.json`: cleared at
//! session start, set during the session, read at session end. The same
//! exclusive-lock, temp-file-plus-rename discipline as the work queue,
//! shrunk to fit.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dispatch_core::FileLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// File name of the persisted flags, under `state/`.
const FLAGS_FILE: &str = "session-flags.json";

/// Bounded wait for the flags lock.
const FLAGS_LOCK_WAIT: Duration = Duration::from_secs(2);

/// Per-session one-shot flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionFlags {
    /// Whether the context-threshold warning has been emitted this
    /// session. Transitions `false → true` at most once per session.
    pub context_threshold_warned: bool,
}

impl SessionFlags {
    /// Load the flags for a project's `state/` directory.
    ///
    /// Missing or unreadable files read as all-clear.
    #[must_use]
    pub fn load(state_dir: &Path) -> Self {
        let path = state_dir.join(FLAGS_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "unreadable session flags, resetting");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the flags. Best effort: a busy lock or write failure logs
    /// a warning and loses this update, nothing else.
    pub fn store(&self, state_dir: &Path) {
        if let Err(e) = self.try_store(state_dir) {
            warn!(error = %e, "session flags not persisted");
        }
    }

    /// Reset all flags, as session-start requires.
    pub fn clear(state_dir: &Path) {
        Self::default().store(state_dir);
    }

    fn try_store(&self, state_dir: &Path) -> std::io::Result<()> {
        let path = state_dir.join(FLAGS_FILE);
        let lock_path = state_dir.join(format!("{FLAGS_FILE}.lock"));
        let _lock = FileLock::exclusive(&lock_path, FLAGS_LOCK_WAIT)?;

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let tmp = state_dir.join(format!(".{FLAGS_FILE}.tmp"));
        {
            let mut options = std::fs::OpenOptions::new();
            options.create(true).truncate(true).write(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            let mut file = options.open(&tmp)?;
            file.write_all(json.as_bytes())?;
        }
        std::fs::rename(&tmp, &path)
    }

    /// Path of the flags file (for the validate command).
    #[must_use]
    pub fn path_in(state_dir: &Path) -> PathBuf {
        state_dir.join(FLAGS_FILE)
    }
}
