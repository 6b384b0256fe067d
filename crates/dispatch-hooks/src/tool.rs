//! The pre-tool-use hook.
//!
//! Consults an optional policy file (`.claude/tool-policy.yaml`, cascaded
//! project → user) and frames an advisory allow/deny for the host. The
//! default policy is permissive, and the hook never blocks by exit code:
//! denial is advice on stdout, visible on stderr.

use dispatch_core::{config_candidates, load_cascade};
use serde::Deserialize;

use crate::dispatcher::{HookOutcome, HookRuntime};
use crate::input::{HookInput, sanitize};

/// File name of the tool policy, under `.claude/`.
const POLICY_FILE: &str = "tool-policy.yaml";

/// Policy verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PolicyAction {
    /// Let the tool run.
    #[default]
    Allow,
    /// Advise the host not to run the tool.
    Deny,
}

impl PolicyAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

/// The cascaded policy document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ToolPolicy {
    /// Verdict for tools matched by neither list.
    default: PolicyAction,
    /// Tools always allowed.
    allow: Vec<String>,
    /// Tools always denied.
    deny: Vec<String>,
}

impl ToolPolicy {
    fn decide(&self, tool: &str) -> PolicyAction {
        if self.allow.iter().any(|t| t == tool) {
            return PolicyAction::Allow;
        }
        if self.deny.iter().any(|t| t == tool) {
            return PolicyAction::Deny;
        }
        self.default
    }
}

pub(crate) fn run(rt: &HookRuntime, input: &HookInput) -> HookOutcome {
    let mut outcome = HookOutcome::default();
    let Some(tool) = input.tool_name.as_deref() else {
        return outcome;
    };
    let tool = sanitize(tool);

    let policy: ToolPolicy = load_cascade(&config_candidates(rt.config_root(), POLICY_FILE));
    let action = policy.decide(&tool);

    let verdict = serde_json::json!({
        "tool": tool,
        "action": action.as_str(),
    });
    outcome.push_block("tool-policy", &verdict.to_string());
    if action == PolicyAction::Deny {
        outcome.push_stderr(format!("[dispatch] tool {tool} is denied by policy"));
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_permissive() {
        let policy = ToolPolicy::default();
        assert_eq!(policy.decide("anything"), PolicyAction::Allow);
    }

    #[test]
    fn test_deny_list() {
        let policy: ToolPolicy =
            serde_yaml::from_str("deny: [rm-rf-tool]\n").unwrap();
        assert_eq!(policy.decide("rm-rf-tool"), PolicyAction::Deny);
        assert_eq!(policy.decide("read-file"), PolicyAction::Allow);
    }

    #[test]
    fn test_allow_overrides_deny() {
        let policy: ToolPolicy =
            serde_yaml::from_str("default: deny\nallow: [read-file]\ndeny: [read-file]\n").unwrap();
        assert_eq!(policy.decide("read-file"), PolicyAction::Allow);
        assert_eq!(policy.decide("other"), PolicyAction::Deny);
    }

    #[test]
    fn test_restrictive_default() {
        let policy: ToolPolicy = serde_yaml::from_str("default: deny\n").unwrap();
        assert_eq!(policy.decide("anything"), PolicyAction::Deny);
    }
}
