//! Routing decision values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two possible routing outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Route straight to a named agent.
    Direct,
    /// Defer agent selection to a more capable decision-maker.
    Escalate,
}

impl Decision {
    /// Decision as written to events.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Escalate => "escalate",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable routing decision.
///
/// `Direct` decisions always carry an agent id that the registry
/// enumerated at decision time; `Escalate` decisions never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Direct or escalate.
    pub decision: Decision,
    /// Target agent for direct routes.
    pub agent: Option<String>,
    /// Auditable explanation of the decision.
    pub reason: String,
    /// Confidence in `[0, 1]`. Mechanical escalations are certain (1.0).
    pub confidence: f64,
    /// First 16 hex digits of the SHA-256 of the request text.
    pub request_hash: String,
}

impl RoutingDecision {
    /// A mechanical escalation: certain, no agent.
    #[must_use]
    pub fn escalate(reason: impl Into<String>, request_hash: impl Into<String>) -> Self {
        Self {
            decision: Decision::Escalate,
            agent: None,
            reason: reason.into(),
            confidence: 1.0,
            request_hash: request_hash.into(),
        }
    }

    /// An escalation with a matcher-derived confidence.
    #[must_use]
    pub fn escalate_scored(
        reason: impl Into<String>,
        confidence: f64,
        request_hash: impl Into<String>,
    ) -> Self {
        Self {
            decision: Decision::Escalate,
            agent: None,
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            request_hash: request_hash.into(),
        }
    }

    /// A direct route to `agent`.
    #[must_use]
    pub fn direct(
        agent: impl Into<String>,
        reason: impl Into<String>,
        confidence: f64,
        request_hash: impl Into<String>,
    ) -> Self {
        Self {
            decision: Decision::Direct,
            agent: Some(agent.into()),
            reason: reason.into(),
            confidence: confidence.clamp(0.0, 1.0),
            request_hash: request_hash.into(),
        }
    }

    /// Whether this decision names an agent to invoke.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.decision == Decision::Direct
    }
}
