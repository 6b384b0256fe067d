//! Shared command context: project, data root, configuration.

use std::path::{Path, PathBuf};

use dispatch_core::{DataDirKind, DataRoot, Project, RouterConfig};
use dispatch_events::EventLog;
use dispatch_queue::WorkQueue;

/// Everything a CLI command needs about where it is running.
pub(crate) struct CommandContext {
    /// The detected project.
    pub project: Project,
    /// The installation data root.
    pub data_root: DataRoot,
    /// Resolved configuration.
    pub config: RouterConfig,
}

impl CommandContext {
    /// Detect from the process working directory.
    pub fn resolve() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project = Project::detect(&cwd);
        let data_root = DataRoot::resolve()?;
        data_root.ensure_project(&project.id)?;
        let config = RouterConfig::load(config_root(&project));
        Ok(Self {
            project,
            data_root,
            config,
        })
    }

    /// Project root for config cascades; `None` for the global sentinel.
    pub fn config_root(&self) -> Option<&Path> {
        config_root(&self.project)
    }

    /// The project's event log.
    pub fn event_log(&self) -> anyhow::Result<EventLog> {
        let dir = self
            .data_root
            .project_dir(&self.project.id, DataDirKind::Metrics)?;
        Ok(EventLog::new(dir))
    }

    /// The project's work queue.
    pub fn work_queue(&self) -> anyhow::Result<WorkQueue> {
        let dir = self
            .data_root
            .project_dir(&self.project.id, DataDirKind::State)?;
        Ok(WorkQueue::new(&dir))
    }

    /// The project's cache directory.
    pub fn cache_dir(&self) -> anyhow::Result<PathBuf> {
        Ok(self
            .data_root
            .project_dir(&self.project.id, DataDirKind::Cache)?)
    }

    /// Agent manifest directories, user level first.
    pub fn agent_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.data_root.agents_dir(),
            self.project.dot_claude().join("agents"),
        ]
    }
}

fn config_root(project: &Project) -> Option<&Path> {
    if project.id.is_global() {
        None
    } else {
        Some(project.root.as_path())
    }
}
