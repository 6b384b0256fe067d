//! Agent manifest types.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};

/// Model tier an agent runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Small, fast, mechanical work.
    Haiku,
    /// General-purpose work.
    Sonnet,
    /// Judgment-heavy work.
    Opus,
    /// Not in the registry; reported in observability, never routed to.
    Unknown,
}

impl ModelTier {
    /// Tier name as written to events and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Haiku => "haiku",
            Self::Sonnet => "sonnet",
            Self::Opus => "opus",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared agent: one YAML manifest file.
///
/// Read-only; Dispatch never writes manifests. The keyword list feeds the
/// fallback matcher, the description feeds the semantic matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Registry id, also the `agent_type` the host reports on invocation.
    pub id: String,
    /// Model tier.
    pub model_tier: ModelTier,
    /// Short free-text description of what the agent is for.
    #[serde(default)]
    pub description: String,
    /// Lowercase keyword fingerprint for the fallback matcher.
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl AgentDefinition {
    /// Parse a manifest file.
    ///
    /// # Errors
    ///
    /// [`AgentError::Io`] if the file cannot be read, [`AgentError::Parse`]
    /// if it is not a valid manifest (including an empty id).
    pub fn from_path(path: &Path) -> AgentResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AgentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let definition: Self =
            serde_yaml::from_str(&content).map_err(|e| AgentError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        if definition.id.trim().is_empty() {
            return Err(AgentError::Parse {
                path: path.display().to_string(),
                message: "manifest has an empty id".to_string(),
            });
        }
        Ok(definition)
    }

    /// Keywords lowercased, as the matcher consumes them.
    #[must_use]
    pub fn keywords_lower(&self) -> Vec<String> {
        self.keywords.iter().map(|k| k.to_lowercase()).collect()
    }
}
