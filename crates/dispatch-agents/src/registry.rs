//! Registry loading and lookup.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::definition::{AgentDefinition, ModelTier};

/// Manifest file extensions the loader accepts.
const MANIFEST_EXTS: [&str; 2] = ["yaml", "yml"];

/// The set of agents available for routing.
///
/// Keyed by agent id in lexicographic order, which is also the matcher's
/// tiebreak order.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: BTreeMap<String, AgentDefinition>,
}

impl AgentRegistry {
    /// Load manifests from `dirs`, in order; a manifest in a later
    /// directory replaces an earlier one with the same id.
    ///
    /// Callers pass the user-level directory first and the project-level
    /// one second, so projects can override installation-wide agents.
    /// Missing directories are fine; unreadable manifests are skipped
    /// with a warning.
    #[must_use]
    pub fn load(dirs: &[PathBuf]) -> Self {
        let mut agents = BTreeMap::new();
        for dir in dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                debug!(dir = %dir.display(), "no agent manifest directory, skipping");
                continue;
            };
            let mut paths: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| is_manifest(p))
                .collect();
            paths.sort();
            for path in paths {
                match AgentDefinition::from_path(&path) {
                    Ok(def) => {
                        if agents.insert(def.id.clone(), def).is_some() {
                            debug!(path = %path.display(), "manifest overrides earlier agent");
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "skipping unreadable agent manifest");
                    },
                }
            }
        }
        Self { agents }
    }

    /// Build a registry from in-memory definitions (useful for testing).
    #[must_use]
    pub fn from_agents(defs: impl IntoIterator<Item = AgentDefinition>) -> Self {
        Self {
            agents: defs.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// All agents, in id order.
    pub fn list(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.agents.values()
    }

    /// Look up an agent by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        self.agents.get(id)
    }

    /// Whether `id` names a registered agent.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    /// Model tier for an agent id; unregistered ids report
    /// [`ModelTier::Unknown`] with a warning.
    #[must_use]
    pub fn model_tier(&self, id: &str) -> ModelTier {
        match self.agents.get(id) {
            Some(def) => def.model_tier,
            None => {
                warn!(agent = id, "agent not in registry, reporting unknown tier");
                ModelTier::Unknown
            },
        }
    }

    /// The preferred target for mechanically simple requests: the first
    /// haiku-tier agent in id order.
    #[must_use]
    pub fn mechanical_agent(&self) -> Option<&AgentDefinition> {
        self.agents
            .values()
            .find(|d| d.model_tier == ModelTier::Haiku)
    }

    /// Number of registered agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| MANIFEST_EXTS.contains(&e))
}
