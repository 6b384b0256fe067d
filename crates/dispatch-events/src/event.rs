//! Event record types.
//!
//! Every record carries an RFC 3339 timestamp with offset and the project
//! envelope, and is discriminated by `record_type`. Events are append-only;
//! nothing in this crate mutates a written record.

use chrono::{DateTime, FixedOffset, Local};
use dispatch_core::Project;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A record in the event log, discriminated by `record_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum Event {
    /// The router produced a recommendation for a submitted prompt.
    RoutingRecommendation {
        /// When the recommendation was made.
        timestamp: DateTime<FixedOffset>,
        /// Correlation hash of the request text.
        request_hash: String,
        /// The headline recommendation.
        recommendation: Recommendation,
        /// The full routing decision, as produced by the router.
        full_analysis: serde_json::Value,
        /// Project envelope.
        project: Project,
    },

    /// An agent invocation was correlated (or not) with a recommendation.
    RequestTracking {
        /// When the invocation was observed.
        timestamp: DateTime<FixedOffset>,
        /// Correlation hash of the matched recommendation, if any.
        request_hash: Option<String>,
        /// The matched recommendation's decision (`direct` / `escalate`),
        /// or `none` when nothing was found in the window.
        routing_decision: String,
        /// Agent the router recommended, if any.
        routing_agent: Option<String>,
        /// Confidence of the matched recommendation.
        routing_confidence: Option<f64>,
        /// Who actually handled the request.
        actual_handler: ActualHandler,
        /// Agent type that was invoked.
        agent_invoked: Option<String>,
        /// Host-assigned id of the invoked agent instance.
        agent_id: Option<String>,
        /// Whether the host followed the recommendation.
        compliance_status: ComplianceStatus,
        /// Project envelope.
        project: Project,
        /// Free-form correlation metadata (reserved for a host-supplied
        /// request id, should the host ever propagate one).
        #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
        metadata: serde_json::Value,
    },

    /// An agent started or stopped.
    AgentEvent {
        /// Which lifecycle edge this is.
        event: AgentLifecycle,
        /// When it was observed.
        timestamp: DateTime<FixedOffset>,
        /// Agent type (registry id).
        agent_type: String,
        /// Host-assigned id of the agent instance.
        agent_id: Option<String>,
        /// Model tier from the registry (`unknown` for unregistered types).
        model_tier: String,
        /// Wall-clock duration, on stop events.
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_sec: Option<f64>,
        /// Project envelope.
        project: Project,
    },

    /// A free-form counter or gauge for the aggregator.
    Metric {
        /// Which solution emitted the metric.
        solution: String,
        /// Metric name.
        name: String,
        /// Metric value.
        value: serde_json::Value,
        /// When it was recorded.
        timestamp: DateTime<FixedOffset>,
        /// Project envelope.
        project: Project,
    },
}

impl Event {
    /// The record's timestamp.
    #[must_use]
    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        match self {
            Self::RoutingRecommendation { timestamp, .. }
            | Self::RequestTracking { timestamp, .. }
            | Self::AgentEvent { timestamp, .. }
            | Self::Metric { timestamp, .. } => timestamp,
        }
    }

    /// The record's project envelope.
    #[must_use]
    pub fn project(&self) -> &Project {
        match self {
            Self::RoutingRecommendation { project, .. }
            | Self::RequestTracking { project, .. }
            | Self::AgentEvent { project, .. }
            | Self::Metric { project, .. } => project,
        }
    }

    /// The `record_type` discriminant as written to the log.
    #[must_use]
    pub fn record_type(&self) -> &'static str {
        match self {
            Self::RoutingRecommendation { .. } => "routing_recommendation",
            Self::RequestTracking { .. } => "request_tracking",
            Self::AgentEvent { .. } => "agent_event",
            Self::Metric { .. } => "metric",
        }
    }
}

/// The current local time with its UTC offset, for new records.
#[must_use]
pub fn now() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

/// The headline of a routing recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Recommended agent; `None` means escalate.
    pub agent: Option<String>,
    /// Why the router decided this.
    pub reason: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Agent lifecycle edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentLifecycle {
    /// The agent started.
    AgentStart,
    /// The agent stopped.
    AgentStop,
}

/// Who actually handled a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActualHandler {
    /// A delegated agent handled it.
    Agent,
    /// The host's main loop handled it directly.
    Main,
}

/// Whether an invocation matched the routing recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    /// The recommended agent (or, after an escalation, any agent) ran.
    Followed,
    /// A different agent ran than the one recommended.
    Ignored,
    /// The recommendation carried no agent directive to follow.
    NoDirective,
    /// No recommendation was found within the correlation window.
    Unknown,
}

impl ComplianceStatus {
    /// Status as written to the log.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Followed => "followed",
            Self::Ignored => "ignored",
            Self::NoDirective => "no_directive",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn project() -> Project {
        Project::from_root(PathBuf::from("/tmp/demo"))
    }

    #[test]
    fn test_record_type_tag() {
        let event = Event::Metric {
            solution: "router".to_string(),
            name: "decisions".to_string(),
            value: serde_json::json!(1),
            timestamp: now(),
            project: project(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["record_type"], "metric");
    }

    #[test]
    fn test_round_trip_recommendation() {
        let event = Event::RoutingRecommendation {
            timestamp: now(),
            request_hash: "0011223344556677".to_string(),
            recommendation: Recommendation {
                agent: Some("haiku-general".to_string()),
                reason: "High-confidence agent match".to_string(),
                confidence: 0.91,
            },
            full_analysis: serde_json::json!({"decision": "direct"}),
            project: project(),
        };
        let line = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&line).unwrap();
        assert_eq!(back.record_type(), "routing_recommendation");
        assert_eq!(back.project().name, "demo");
    }

    #[test]
    fn test_round_trip_tracking() {
        let event = Event::RequestTracking {
            timestamp: now(),
            request_hash: Some("aabbccddeeff0011".to_string()),
            routing_decision: "direct".to_string(),
            routing_agent: Some("haiku-general".to_string()),
            routing_confidence: Some(0.9),
            actual_handler: ActualHandler::Agent,
            agent_invoked: Some("sonnet-general".to_string()),
            agent_id: Some("a-1".to_string()),
            compliance_status: ComplianceStatus::Ignored,
            project: project(),
            metadata: serde_json::Value::Null,
        };
        let line = serde_json::to_string(&event).unwrap();
        assert!(!line.contains("metadata"));
        let back: Event = serde_json::from_str(&line).unwrap();
        match back {
            Event::RequestTracking {
                compliance_status, ..
            } => assert_eq!(compliance_status, ComplianceStatus::Ignored),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_carries_offset() {
        let event = Event::Metric {
            solution: "queue".to_string(),
            name: "wip_limit".to_string(),
            value: serde_json::json!(3),
            timestamp: now(),
            project: project(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let ts = value["timestamp"].as_str().unwrap();
        DateTime::parse_from_rfc3339(ts).expect("timestamp should be RFC 3339 with offset");
    }

    #[test]
    fn test_duration_omitted_when_absent() {
        let event = Event::AgentEvent {
            event: AgentLifecycle::AgentStart,
            timestamp: now(),
            agent_type: "haiku-general".to_string(),
            agent_id: None,
            model_tier: "haiku".to_string(),
            duration_sec: None,
            project: project(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("duration_sec"));
    }
}
