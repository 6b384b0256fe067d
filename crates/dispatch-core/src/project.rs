//! Project detection and identity.
//!
//! A project is the nearest ancestor of the working directory that contains
//! a `.claude/` marker directory. Identity is derived, never persisted: the
//! first 16 hex digits of the SHA-256 of the absolute root path. Working
//! directories with no marker anywhere above them share the `global`
//! sentinel identity.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hash::hex16;

/// Environment variable overriding project detection.
///
/// Must name an existing absolute directory that contains `.claude/`;
/// anything else is rejected with a warning and the ancestor walk is used
/// instead.
pub const PROJECT_ROOT_ENV: &str = "CLAUDE_PROJECT_ROOT";

/// Sentinel identity for working directories outside any project.
pub const GLOBAL_PROJECT_ID: &str = "global";

/// A derived project identifier.
///
/// Either 16 hex digits of the root-path hash, or the literal `global`
/// sentinel. Used as a directory name under `projects/`, so it never
/// contains path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Derive the identifier for a project root path.
    #[must_use]
    pub fn from_root(root: &Path) -> Self {
        Self(hex16(root.as_os_str().as_encoded_bytes()))
    }

    /// The sentinel identity shared by all unmarked working directories.
    #[must_use]
    pub fn global() -> Self {
        Self(GLOBAL_PROJECT_ID.to_string())
    }

    /// Whether this is the `global` sentinel.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_PROJECT_ID
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A detected project: identity plus the paths everything else hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Derived identifier (`projects/<id>/` directory name).
    pub id: ProjectId,
    /// Absolute root path. For the global sentinel this is the working
    /// directory the detection started from.
    pub root: PathBuf,
    /// Basename of the root, for human-readable reports.
    pub name: String,
}

impl Project {
    /// Detect the project for a working directory.
    ///
    /// Detection order:
    /// 1. [`PROJECT_ROOT_ENV`], when it names an existing absolute
    ///    directory containing `.claude/` (invalid values warn and fall
    ///    through)
    /// 2. Nearest ancestor of `cwd` (including `cwd` itself) containing a
    ///    `.claude/` directory
    /// 3. The `global` sentinel
    #[must_use]
    pub fn detect(cwd: &Path) -> Self {
        if let Some(root) = env_override() {
            return Self::from_root(root);
        }

        let start = absolute(cwd);
        let mut current = start.as_path();
        loop {
            if current.join(".claude").is_dir() {
                return Self::from_root(current.to_path_buf());
            }
            match current.parent() {
                Some(parent) if parent != current => current = parent,
                _ => break,
            }
        }

        Self::global(start)
    }

    /// Build a project from a known root (no detection).
    #[must_use]
    pub fn from_root(root: PathBuf) -> Self {
        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            id: ProjectId::from_root(&root),
            root,
            name,
        }
    }

    /// The global sentinel project for an unmarked working directory.
    #[must_use]
    pub fn global(cwd: PathBuf) -> Self {
        Self {
            id: ProjectId::global(),
            root: cwd,
            name: GLOBAL_PROJECT_ID.to_string(),
        }
    }

    /// Path of the project-level `.claude/` directory.
    #[must_use]
    pub fn dot_claude(&self) -> PathBuf {
        self.root.join(".claude")
    }
}

/// Validate the detection override, if set.
///
/// Relative paths, missing directories, and directories without a
/// `.claude/` marker are rejected: a stale override silently splitting a
/// project's state is worse than falling back to auto-detection.
fn env_override() -> Option<PathBuf> {
    let raw = std::env::var(PROJECT_ROOT_ENV).ok()?;
    if raw.is_empty() {
        return None;
    }
    let path = PathBuf::from(&raw);
    if !path.is_absolute() {
        warn!(path = %raw, "{PROJECT_ROOT_ENV} is not absolute; ignoring");
        return None;
    }
    if !path.join(".claude").is_dir() {
        warn!(
            path = %raw,
            "{PROJECT_ROOT_ENV} does not contain a .claude/ directory; ignoring"
        );
        return None;
    }
    Some(path)
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate the process-wide override env var.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_detect_with_marker() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::remove_var(PROJECT_ROOT_ENV) };

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".claude")).unwrap();
        let sub = dir.path().join("src").join("deep");
        std::fs::create_dir_all(&sub).unwrap();

        let project = Project::detect(&sub);
        assert_eq!(project.root, dir.path());
        assert!(!project.id.is_global());
    }

    #[test]
    fn test_detect_without_marker_is_global() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::remove_var(PROJECT_ROOT_ENV) };

        let dir = tempfile::tempdir().unwrap();
        let project = Project::detect(dir.path());
        assert!(project.id.is_global());
        assert_eq!(project.name, GLOBAL_PROJECT_ID);
    }

    #[test]
    fn test_detect_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".claude")).unwrap();

        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var(PROJECT_ROOT_ENV, dir.path()) };
        let elsewhere = tempfile::tempdir().unwrap();
        let project = Project::detect(elsewhere.path());
        assert_eq!(project.root, dir.path());
        unsafe { std::env::remove_var(PROJECT_ROOT_ENV) };
    }

    #[test]
    fn test_detect_rejects_override_without_marker() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let bogus = tempfile::tempdir().unwrap();

        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var(PROJECT_ROOT_ENV, bogus.path()) };
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".claude")).unwrap();

        let project = Project::detect(dir.path());
        assert_eq!(project.root, dir.path());
        unsafe { std::env::remove_var(PROJECT_ROOT_ENV) };
    }

    #[test]
    fn test_detect_rejects_relative_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        // SAFETY: serialized by ENV_MUTEX
        unsafe { std::env::set_var(PROJECT_ROOT_ENV, "relative/path") };

        let dir = tempfile::tempdir().unwrap();
        let project = Project::detect(dir.path());
        assert!(project.id.is_global());
        unsafe { std::env::remove_var(PROJECT_ROOT_ENV) };
    }

    #[test]
    fn test_id_stable_across_derivations() {
        let root = Path::new("/home/user/project");
        assert_eq!(ProjectId::from_root(root), ProjectId::from_root(root));
    }

    #[test]
    fn test_distinct_roots_distinct_ids() {
        assert_ne!(
            ProjectId::from_root(Path::new("/tmp/a")),
            ProjectId::from_root(Path::new("/tmp/b"))
        );
    }

    #[test]
    fn test_id_shape() {
        let id = ProjectId::from_root(Path::new("/tmp/a"));
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_project_name_is_basename() {
        let project = Project::from_root(PathBuf::from("/home/user/widgets"));
        assert_eq!(project.name, "widgets");
    }

    #[test]
    fn test_id_serde_transparent() {
        let id = ProjectId::global();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"global\"");
        let back: ProjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
