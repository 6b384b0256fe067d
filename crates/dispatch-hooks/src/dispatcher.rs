//! Hook runtime and dispatch.

use std::path::{Path, PathBuf};

use dispatch_agents::AgentRegistry;
use dispatch_core::{
    CoreResult, DataDirKind, DataRoot, HookKind, Project, RouterConfig, is_router_enabled,
};
use dispatch_events::EventLog;
use tracing::{debug, warn};

use crate::input::HookInput;
use crate::{agent, prompt_submit, session, tool};

/// What a hook invocation hands back to the binary: advisory stdout for
/// the host, diagnostic lines for the user. There is no failure variant —
/// hooks report success to the host no matter what.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HookOutcome {
    /// Advisory output the host injects into its context.
    pub stdout: String,
    /// User-visible diagnostic lines.
    pub stderr: Vec<String>,
}

impl HookOutcome {
    /// Append a delimiter-framed advisory block to stdout.
    pub fn push_block(&mut self, tag: &str, content: &str) {
        self.stdout.push_str(&format!("<{tag}>\n{content}\n</{tag}>\n"));
    }

    /// Append a user-visible diagnostic line.
    pub fn push_stderr(&mut self, line: impl Into<String>) {
        self.stderr.push(line.into());
    }
}

/// Everything a hook needs about where it is running.
#[derive(Debug)]
pub struct HookRuntime {
    project: Project,
    data_root: DataRoot,
    config: RouterConfig,
}

impl HookRuntime {
    /// A runtime for an explicit project and data root (useful for
    /// testing).
    #[must_use]
    pub fn new(project: Project, data_root: DataRoot) -> Self {
        let config = RouterConfig::load(config_root(&project));
        Self {
            project,
            data_root,
            config,
        }
    }

    /// Resolve the runtime from a hook payload: detect the project from
    /// the payload's `cwd` (falling back to the process working
    /// directory) and resolve the installation data root.
    ///
    /// # Errors
    ///
    /// Returns an error only when no data root can be resolved at all.
    pub fn for_input(input: &HookInput) -> CoreResult<Self> {
        let cwd = input
            .cwd
            .as_ref()
            .map_or_else(
                || std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
                PathBuf::from,
            );
        let project = Project::detect(&cwd);
        let data_root = DataRoot::resolve()?;
        Ok(Self::new(project, data_root))
    }

    /// Run one hook. Never fails; internal problems surface as stderr
    /// lines and skipped side effects.
    #[must_use]
    pub fn run(&self, kind: HookKind, input: &HookInput) -> HookOutcome {
        if !is_router_enabled(config_root(&self.project)) {
            debug!(project = %self.project.id, hook = %kind, "router disabled, passing through");
            return HookOutcome::default();
        }
        if let Err(e) = self.data_root.ensure_project(&self.project.id) {
            let mut outcome = HookOutcome::default();
            outcome.push_stderr(format!("[dispatch] cannot prepare project state: {e}"));
            return outcome;
        }

        match kind {
            HookKind::PromptSubmit => prompt_submit::run(self, input),
            HookKind::AgentStart => agent::on_start(self, input),
            HookKind::AgentStop => agent::on_stop(self, input),
            HookKind::SessionStart => session::on_start(self),
            HookKind::SessionEnd => session::on_end(self),
            HookKind::PreToolUse => tool::run(self, input),
        }
    }

    /// The detected project.
    #[must_use]
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The resolved configuration.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The installation data root.
    #[must_use]
    pub fn data_root(&self) -> &DataRoot {
        &self.data_root
    }

    /// Project root for config cascades; `None` for the global sentinel.
    pub(crate) fn config_root(&self) -> Option<&Path> {
        config_root(&self.project)
    }

    /// The project's event log, if its metrics directory is usable.
    pub(crate) fn event_log(&self) -> Option<EventLog> {
        match self.data_root.project_dir(&self.project.id, DataDirKind::Metrics) {
            Ok(dir) => Some(EventLog::new(dir)),
            Err(e) => {
                warn!(error = %e, "metrics directory unavailable, events skipped");
                None
            },
        }
    }

    /// The project's `state/` directory, if usable.
    pub(crate) fn state_dir(&self) -> Option<PathBuf> {
        match self.data_root.project_dir(&self.project.id, DataDirKind::State) {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!(error = %e, "state directory unavailable");
                None
            },
        }
    }

    /// The project's `cache/` directory, if usable.
    pub(crate) fn cache_dir(&self) -> Option<PathBuf> {
        self.data_root
            .project_dir(&self.project.id, DataDirKind::Cache)
            .ok()
    }

    /// The project's `memory/` directory, if usable.
    pub(crate) fn memory_dir(&self) -> Option<PathBuf> {
        self.data_root
            .project_dir(&self.project.id, DataDirKind::Memory)
            .ok()
    }

    /// The project's `logs/` directory, if usable.
    pub(crate) fn logs_dir(&self) -> Option<PathBuf> {
        self.data_root
            .project_dir(&self.project.id, DataDirKind::Logs)
            .ok()
    }

    /// The agent registry: user-level manifests overridden by
    /// project-level ones.
    pub(crate) fn registry(&self) -> AgentRegistry {
        AgentRegistry::load(&[
            self.data_root.agents_dir(),
            self.project.dot_claude().join("agents"),
        ])
    }
}

fn config_root(project: &Project) -> Option<&Path> {
    if project.id.is_global() {
        None
    } else {
        Some(project.root.as_path())
    }
}
