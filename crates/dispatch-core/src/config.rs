//! Layered configuration.
//!
//! Two files drive behaviour, both optional at every level:
//!
//! - `settings.json` — the host's settings file; Dispatch only reads the
//!   `plugins.router.enabled` gate from it.
//! - `router.yaml` — Dispatch's own options (`force_mode`,
//!   `confidence_threshold`, `cache_ttl_days`, `wip_limit`,
//!   `retention_days`).
//!
//! Resolution cascade, first match wins:
//! 1. `<project_root>/.claude/<file>`
//! 2. `<user_home>/.claude/<file>`
//! 3. Built-in defaults
//!
//! A level that exists but fails to parse logs a warning and falls
//! through to the next level; configuration can degrade the feature set
//! but never abort a hook.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// File name of the host settings file.
pub const SETTINGS_FILE: &str = "settings.json";

/// File name of the router options file.
pub const ROUTER_CONFIG_FILE: &str = "router.yaml";

/// Routing pipeline override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceMode {
    /// Keyword matcher only; never consult the semantic matcher.
    SingleStage,
    /// Consult the semantic matcher even when `ROUTER_USE_LLM` is unset.
    MultiStage,
}

/// Dispatch's own options (`router.yaml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Routing pipeline override; `None` means the normal two-stage flow.
    pub force_mode: Option<ForceMode>,
    /// Minimum matcher confidence for a direct route. `None` uses the
    /// matcher's own default (0.8 keyword, 0.7 semantic).
    pub confidence_threshold: Option<f64>,
    /// Route cache entry lifetime in days.
    pub cache_ttl_days: u32,
    /// Maximum concurrently in-progress work items per project.
    pub wip_limit: usize,
    /// Age in days past which daily event logs may be deleted.
    pub retention_days: u32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            force_mode: None,
            confidence_threshold: None,
            cache_ttl_days: 30,
            wip_limit: 3,
            retention_days: 90,
        }
    }
}

impl RouterConfig {
    /// Load with the standard cascade for `project_root`.
    #[must_use]
    pub fn load(project_root: Option<&Path>) -> Self {
        load_cascade(&config_candidates(project_root, ROUTER_CONFIG_FILE))
    }
}

/// A parsed `settings.json`.
///
/// The file belongs to the host and carries keys Dispatch knows nothing
/// about, so it is held as a raw JSON tree and probed.
#[derive(Debug, Clone)]
pub struct Settings {
    value: serde_json::Value,
}

impl Settings {
    /// Read and parse a settings file.
    ///
    /// Returns `None` when the file is missing; logs a warning and returns
    /// `None` when it exists but cannot be parsed.
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let content = read_optional(path)?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(Self { value }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unparseable settings file, skipping");
                None
            },
        }
    }

    /// The `plugins.router.enabled` gate.
    ///
    /// `Some(false)` only for an explicit JSON `false`; any other present
    /// value reads as enabled; `None` when the key is absent.
    #[must_use]
    pub fn router_enabled(&self) -> Option<bool> {
        let v = self
            .value
            .get("plugins")?
            .get("router")?
            .get("enabled")?;
        Some(!matches!(v, serde_json::Value::Bool(false)))
    }
}

/// Whether routing is enabled for a project.
///
/// Missing files and missing keys mean enabled; only an explicit
/// `plugins.router.enabled: false` disables. Idempotent and read-only.
#[must_use]
pub fn is_router_enabled(project_root: Option<&Path>) -> bool {
    is_router_enabled_at(&config_candidates(project_root, SETTINGS_FILE))
}

/// Enable check over an explicit candidate list (cascade order).
#[must_use]
pub fn is_router_enabled_at(candidates: &[PathBuf]) -> bool {
    for path in candidates {
        if let Some(settings) = Settings::load(path) {
            if let Some(enabled) = settings.router_enabled() {
                return enabled;
            }
        }
    }
    true
}

/// Candidate paths for `file_name`, in cascade order.
#[must_use]
pub fn config_candidates(project_root: Option<&Path>, file_name: &str) -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(root) = project_root {
        candidates.push(root.join(".claude").join(file_name));
    }
    if let Some(dirs) = directories::BaseDirs::new() {
        candidates.push(dirs.home_dir().join(".claude").join(file_name));
    }
    candidates
}

/// First existing, parseable candidate deserialized as `T`; defaults when
/// none qualifies.
///
/// Format follows the extension: `.json` parses as JSON, everything else
/// as YAML.
#[must_use]
pub fn load_cascade<T: DeserializeOwned + Default>(candidates: &[PathBuf]) -> T {
    for path in candidates {
        let Some(content) = read_optional(path) else {
            continue;
        };
        let parsed = if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        match parsed {
            Ok(value) => return value,
            Err(message) => {
                warn!(path = %path.display(), error = %message, "unparseable config, falling through");
            },
        }
    }
    T::default()
}

/// Read a file that is allowed to be absent.
///
/// A single read, no exists-check beforehand, so there is no window for
/// the file to vanish between stat and read. Non-NotFound errors warn and
/// read as absent.
fn read_optional(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable config file, skipping");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_router_config_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.cache_ttl_days, 30);
        assert_eq!(config.wip_limit, 3);
        assert_eq!(config.retention_days, 90);
        assert!(config.force_mode.is_none());
        assert!(config.confidence_threshold.is_none());
    }

    #[test]
    fn test_load_cascade_project_wins() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.yaml");
        let user = dir.path().join("user.yaml");
        write(&project, "wip_limit: 5\n");
        write(&user, "wip_limit: 7\n");

        let config: RouterConfig = load_cascade(&[project, user]);
        assert_eq!(config.wip_limit, 5);
        // Unset fields come from defaults.
        assert_eq!(config.retention_days, 90);
    }

    #[test]
    fn test_load_cascade_falls_through_unparseable() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.yaml");
        let user = dir.path().join("user.yaml");
        write(&broken, "wip_limit: [not an int\n");
        write(&user, "wip_limit: 7\n");

        let config: RouterConfig = load_cascade(&[broken, user]);
        assert_eq!(config.wip_limit, 7);
    }

    #[test]
    fn test_load_cascade_all_missing_defaults() {
        let config: RouterConfig =
            load_cascade(&[PathBuf::from("/nonexistent/router.yaml")]);
        assert_eq!(config, RouterConfig::default());
    }

    #[test]
    fn test_force_mode_parse() {
        let config: RouterConfig =
            serde_yaml::from_str("force_mode: single_stage\n").unwrap();
        assert_eq!(config.force_mode, Some(ForceMode::SingleStage));
    }

    #[test]
    fn test_enabled_missing_file_is_enabled() {
        assert!(is_router_enabled_at(&[PathBuf::from(
            "/nonexistent/settings.json"
        )]));
    }

    #[test]
    fn test_enabled_missing_key_is_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write(&path, r#"{"model": "opus"}"#);
        assert!(is_router_enabled_at(&[path]));
    }

    #[test]
    fn test_enabled_explicit_false_disables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write(&path, r#"{"plugins": {"router": {"enabled": false}}}"#);
        assert!(!is_router_enabled_at(&[path]));
    }

    #[test]
    fn test_enabled_non_boolean_is_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        write(&path, r#"{"plugins": {"router": {"enabled": "off"}}}"#);
        assert!(is_router_enabled_at(&[path]));
    }

    #[test]
    fn test_enabled_unparseable_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        let user = dir.path().join("user.json");
        write(&broken, "{not json");
        write(&user, r#"{"plugins": {"router": {"enabled": false}}}"#);
        assert!(!is_router_enabled_at(&[broken, user]));
    }

    #[test]
    fn test_enabled_project_overrides_user() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("project.json");
        let user = dir.path().join("user.json");
        write(&project, r#"{"plugins": {"router": {"enabled": true}}}"#);
        write(&user, r#"{"plugins": {"router": {"enabled": false}}}"#);
        assert!(is_router_enabled_at(&[project, user]));
    }
}
