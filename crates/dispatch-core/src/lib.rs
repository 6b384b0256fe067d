//! Dispatch Core - Project identity and configuration substrate.
//!
//! This crate provides:
//! - Project detection (nearest ancestor containing a `.claude/` marker)
//! - Stable project identifiers derived from the project root path
//! - Per-project data directories with owner-only permissions
//! - The layered configuration cascade (project → user → defaults)
//! - The hook-event vocabulary shared by the hook dispatcher and the CLI
//!
//! # Isolation Model
//!
//! Every piece of persisted state is scoped to a project. A project is
//! identified by the first 16 hex digits of the SHA-256 of its absolute
//! root path; two distinct roots therefore get disjoint state trees with
//! overwhelming probability. Working directories with no `.claude/` marker
//! anywhere above them share the `global` sentinel project.
//!
//! # Example
//!
//! ```
//! use dispatch_core::{DataDirKind, DataRoot, Project};
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::create_dir(dir.path().join(".claude")).unwrap();
//!
//! let project = Project::detect(dir.path());
//! assert_eq!(project.id.as_str().len(), 16);
//!
//! let data_root = DataRoot::from_path(dir.path().join("data"));
//! let metrics = data_root.project_dir(&project.id, DataDirKind::Metrics).unwrap();
//! assert!(metrics.ends_with(format!("projects/{}/metrics", project.id)));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod config;
mod dirs;
mod error;
mod hash;
mod hook_event;
mod lockfile;
mod project;

pub use config::{
    ForceMode, ROUTER_CONFIG_FILE, RouterConfig, SETTINGS_FILE, Settings, config_candidates,
    is_router_enabled, is_router_enabled_at, load_cascade,
};
pub use dirs::{DATA_DIR_ENV, DataDirKind, DataRoot};
pub use error::{CoreError, CoreResult};
pub use hash::{hex16, request_hash};
pub use hook_event::HookKind;
pub use lockfile::FileLock;
pub use project::{GLOBAL_PROJECT_ID, PROJECT_ROOT_ENV, Project, ProjectId};
