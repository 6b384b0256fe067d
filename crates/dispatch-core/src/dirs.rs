//! Data directory scaffolding.
//!
//! All persisted state lives under a single data root, by default
//! `~/.claude/dispatch/` (overridable with `$DISPATCH_DATA_DIR`), laid out
//! per project:
//!
//! ```text
//! ~/.claude/dispatch/               (DataRoot)
//! ├── agents/                         (user-level agent manifests)
//! └── projects/<id>/
//!     ├── state/                      (work-queue.json, session-flags.json)
//!     ├── metrics/                    (YYYY-MM-DD.jsonl + .lock sidecars)
//!     ├── logs/                       (routing.log)
//!     ├── memory/                     (session summaries)
//!     └── cache/                      (<key>.json route cache entries)
//! ```
//!
//! Directories are created on demand with mode `0700`; no two projects
//! ever share a subtree.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::project::ProjectId;

/// Environment variable overriding the data root (absolute path).
pub const DATA_DIR_ENV: &str = "DISPATCH_DATA_DIR";

/// The kinds of per-project data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataDirKind {
    /// Mutable coordination state (work queue, session flags).
    State,
    /// Append-only daily event logs.
    Metrics,
    /// Plain-text operator logs.
    Logs,
    /// Session summaries and briefing material.
    Memory,
    /// Route cache entries.
    Cache,
}

impl DataDirKind {
    /// All kinds, in layout order.
    pub const ALL: [Self; 5] = [
        Self::State,
        Self::Metrics,
        Self::Logs,
        Self::Memory,
        Self::Cache,
    ];

    /// Directory name under `projects/<id>/`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Metrics => "metrics",
            Self::Logs => "logs",
            Self::Memory => "memory",
            Self::Cache => "cache",
        }
    }
}

impl fmt::Display for DataDirKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The installation-wide data root.
#[derive(Debug, Clone)]
pub struct DataRoot {
    root: PathBuf,
}

impl DataRoot {
    /// Resolve the data root.
    ///
    /// Checks `$DISPATCH_DATA_DIR` first (must be absolute), then falls
    /// back to `<home>/.claude/dispatch/`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoHomeDir`] if no override is set and the home
    /// directory cannot be determined.
    pub fn resolve() -> CoreResult<Self> {
        if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            let p = PathBuf::from(&custom);
            if p.is_absolute() {
                return Ok(Self { root: p });
            }
            tracing::warn!(path = %custom, "{DATA_DIR_ENV} is not absolute; ignoring");
        }
        let home = directories::BaseDirs::new()
            .map(|d| d.home_dir().to_path_buf())
            .ok_or(CoreError::NoHomeDir)?;
        Ok(Self {
            root: home.join(".claude").join("dispatch"),
        })
    }

    /// Create from an explicit path (useful for testing).
    #[must_use]
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// User-level agent manifest directory (`<root>/agents/`).
    #[must_use]
    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    /// Per-project directory of the given kind, without creating it.
    #[must_use]
    pub fn project_dir_path(&self, id: &ProjectId, kind: DataDirKind) -> PathBuf {
        self.root.join("projects").join(id.as_str()).join(kind.as_str())
    }

    /// Per-project directory of the given kind, created on demand with
    /// mode `0700`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] if creation or permission setting fails.
    pub fn project_dir(&self, id: &ProjectId, kind: DataDirKind) -> CoreResult<PathBuf> {
        let path = self.project_dir_path(id, kind);
        create_private_dir(&path)?;
        Ok(path)
    }

    /// Ensure every per-project directory kind exists for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Io`] on the first kind that fails.
    pub fn ensure_project(&self, id: &ProjectId) -> CoreResult<()> {
        for kind in DataDirKind::ALL {
            self.project_dir(id, kind)?;
        }
        Ok(())
    }
}

/// `create_dir_all` followed by `0700` on the leaf (Unix).
fn create_private_dir(path: &Path) -> CoreResult<()> {
    std::fs::create_dir_all(path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700)).map_err(
            |source| CoreError::Io {
                path: path.display().to_string(),
                source,
            },
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let root = DataRoot::from_path(dir.path());
        let id = ProjectId::from_root(Path::new("/tmp/demo"));

        let metrics = root.project_dir(&id, DataDirKind::Metrics).unwrap();
        assert_eq!(
            metrics,
            dir.path()
                .join("projects")
                .join(id.as_str())
                .join("metrics")
        );
        assert!(metrics.is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_project_dir_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let root = DataRoot::from_path(dir.path());
        let id = ProjectId::global();

        let state = root.project_dir(&id, DataDirKind::State).unwrap();
        let mode = std::fs::metadata(&state).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_project_dir_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let root = DataRoot::from_path(dir.path());
        let id = ProjectId::global();

        let a = root.project_dir(&id, DataDirKind::Cache).unwrap();
        let b = root.project_dir(&id, DataDirKind::Cache).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_projects_disjoint_trees() {
        let dir = tempfile::tempdir().unwrap();
        let root = DataRoot::from_path(dir.path());
        let a = ProjectId::from_root(Path::new("/tmp/a"));
        let b = ProjectId::from_root(Path::new("/tmp/b"));

        let dir_a = root.project_dir_path(&a, DataDirKind::State);
        let dir_b = root.project_dir_path(&b, DataDirKind::State);
        assert!(!dir_a.starts_with(&dir_b));
        assert!(!dir_b.starts_with(&dir_a));
    }

    #[test]
    fn test_ensure_project_creates_all_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let root = DataRoot::from_path(dir.path());
        let id = ProjectId::global();
        root.ensure_project(&id).unwrap();
        for kind in DataDirKind::ALL {
            assert!(root.project_dir_path(&id, kind).is_dir(), "{kind} missing");
        }
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DataDirKind::State.as_str(), "state");
        assert_eq!(DataDirKind::Metrics.to_string(), "metrics");
    }
}
