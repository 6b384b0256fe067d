//! Host lifecycle hook vocabulary.
//!
//! `HookKind` lives in `dispatch-core` so that both the hook dispatcher
//! and the CLI can reference it without a circular dependency.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle events at which the host invokes Dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    /// The user submitted a prompt.
    PromptSubmit,
    /// An agent is starting.
    AgentStart,
    /// An agent has stopped.
    AgentStop,
    /// A session has started.
    SessionStart,
    /// A session is ending.
    SessionEnd,
    /// Before an opaque tool invocation.
    PreToolUse,
}

impl HookKind {
    /// All hooks, in host registration order.
    pub const ALL: [Self; 6] = [
        Self::PromptSubmit,
        Self::AgentStart,
        Self::AgentStop,
        Self::SessionStart,
        Self::SessionEnd,
        Self::PreToolUse,
    ];

    /// Hook name as the host spells it.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PromptSubmit => "prompt-submit",
            Self::AgentStart => "agent-start",
            Self::AgentStop => "agent-stop",
            Self::SessionStart => "session-start",
            Self::SessionEnd => "session-end",
            Self::PreToolUse => "pre-tool-use",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown hook: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all() {
        for kind in HookKind::ALL {
            assert_eq!(kind.as_str().parse::<HookKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_rejected() {
        assert!("post-commit".parse::<HookKind>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(HookKind::PromptSubmit.to_string(), "prompt-submit");
        assert_eq!(HookKind::PreToolUse.to_string(), "pre-tool-use");
    }
}
