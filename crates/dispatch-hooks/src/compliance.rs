//! Compliance tracking.
//!
//! Joins an agent invocation to the most recent routing recommendation
//! within a temporal window. The join is temporal because the host does
//! not propagate a request identifier to the agent-start hook; the
//! window is the primary source of `unknown` classifications. Should the
//! host ever supply a request id, it belongs in the tracking event's
//! `metadata` and should replace this join.

use chrono::{DateTime, FixedOffset};
use dispatch_core::Project;
use dispatch_events::{
    ActualHandler, ComplianceStatus, Event, EventLog, Recommendation,
};
use tracing::warn;

/// How far back an invocation looks for its recommendation, in seconds.
pub const COMPLIANCE_WINDOW_SECS: i64 = 60;

/// How many tail records of today's log the tracker scans.
pub const TAIL_SCAN: usize = 200;

/// The outcome of tracking one invocation.
#[derive(Debug)]
pub(crate) struct Tracking {
    /// The `request_tracking` event to append.
    pub event: Event,
    /// A user-visible warning, set when the recommendation was ignored.
    pub warning: Option<String>,
}

/// Classify an agent invocation against the recent log.
pub(crate) fn track_invocation(
    log: &EventLog,
    project: &Project,
    agent_type: &str,
    agent_id: Option<&str>,
    now: DateTime<FixedOffset>,
) -> Tracking {
    let recent = match log.read_tail(now.date_naive(), TAIL_SCAN) {
        Ok(events) => events,
        Err(e) => {
            warn!(error = %e, "cannot read event log for compliance tracking");
            Vec::new()
        },
    };

    let matched = recent.iter().rev().find_map(|event| match event {
        Event::RoutingRecommendation {
            timestamp,
            request_hash,
            recommendation,
            full_analysis,
            ..
        } if in_window(*timestamp, now) => {
            Some((request_hash.clone(), recommendation.clone(), full_analysis.clone()))
        },
        _ => None,
    });

    let (request_hash, routing_decision, routing_agent, routing_confidence, status) =
        match matched {
            None => (None, "none".to_string(), None, None, ComplianceStatus::Unknown),
            Some((hash, recommendation, full_analysis)) => {
                let decision = full_analysis
                    .get("decision")
                    .and_then(|d| d.as_str())
                    .unwrap_or("escalate")
                    .to_string();
                let status = classify(&decision, &recommendation, agent_type);
                (
                    Some(hash),
                    decision,
                    recommendation.agent,
                    Some(recommendation.confidence),
                    status,
                )
            },
        };

    let warning = (status == ComplianceStatus::Ignored).then(|| {
        format!(
            "routing recommended {} but {} was invoked",
            routing_agent.as_deref().unwrap_or("direct handling"),
            agent_type
        )
    });

    Tracking {
        event: Event::RequestTracking {
            timestamp: now,
            request_hash,
            routing_decision,
            routing_agent,
            routing_confidence,
            actual_handler: ActualHandler::Agent,
            agent_invoked: Some(agent_type.to_string()),
            agent_id: agent_id.map(ToString::to_string),
            compliance_status: status,
            project: project.clone(),
            metadata: serde_json::Value::Null,
        },
        warning,
    }
}

fn in_window(timestamp: DateTime<FixedOffset>, now: DateTime<FixedOffset>) -> bool {
    let age = (now - timestamp).num_seconds();
    (0..=COMPLIANCE_WINDOW_SECS).contains(&age)
}

/// The classification table.
///
/// - A direct recommendation is followed only by its named agent.
/// - An escalation is followed by any agent: deferring selection means
///   any delegate satisfies the directive.
/// - A direct recommendation with no agent should not occur; it reads as
///   "handle in the main loop", so any invocation counts as ignored.
/// - Anything else carries no directive to follow.
fn classify(decision: &str, recommendation: &Recommendation, invoked: &str) -> ComplianceStatus {
    match (decision, &recommendation.agent) {
        ("direct", Some(agent)) | ("escalate", Some(agent)) => {
            if agent == invoked {
                ComplianceStatus::Followed
            } else {
                ComplianceStatus::Ignored
            }
        },
        ("escalate", None) => ComplianceStatus::Followed,
        ("direct", None) => ComplianceStatus::Ignored,
        _ => ComplianceStatus::NoDirective,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatch_events::now;
    use std::path::PathBuf;

    fn project() -> Project {
        Project::from_root(PathBuf::from("/tmp/demo"))
    }

    fn recommendation_at(
        timestamp: DateTime<FixedOffset>,
        agent: Option<&str>,
        decision: &str,
    ) -> Event {
        Event::RoutingRecommendation {
            timestamp,
            request_hash: "aabbccdd00112233".to_string(),
            recommendation: Recommendation {
                agent: agent.map(ToString::to_string),
                reason: "test".to_string(),
                confidence: 0.9,
            },
            full_analysis: serde_json::json!({"decision": decision}),
            project: project(),
        }
    }

    fn tracked_status(event: &Event) -> ComplianceStatus {
        match event {
            Event::RequestTracking {
                compliance_status, ..
            } => *compliance_status,
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_followed_when_agent_matches() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let t = now();
        log.append(&recommendation_at(t, Some("haiku-general"), "direct"))
            .unwrap();

        let tracking = track_invocation(&log, &project(), "haiku-general", Some("i-1"), t);
        assert_eq!(tracked_status(&tracking.event), ComplianceStatus::Followed);
        assert!(tracking.warning.is_none());
    }

    #[test]
    fn test_ignored_when_agent_differs() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let t = now();
        log.append(&recommendation_at(t, Some("haiku-general"), "direct"))
            .unwrap();

        let tracking = track_invocation(&log, &project(), "sonnet-general", None, t);
        assert_eq!(tracked_status(&tracking.event), ComplianceStatus::Ignored);
        let warning = tracking.warning.unwrap();
        assert!(warning.contains("haiku-general"));
        assert!(warning.contains("sonnet-general"));
    }

    #[test]
    fn test_escalation_followed_by_any_agent() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let t = now();
        log.append(&recommendation_at(t, None, "escalate")).unwrap();

        let tracking = track_invocation(&log, &project(), "opus-planner", None, t);
        assert_eq!(tracked_status(&tracking.event), ComplianceStatus::Followed);
    }

    #[test]
    fn test_unknown_when_no_recommendation_in_window() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let t = now();
        // A recommendation well outside the window.
        log.append(&recommendation_at(
            t - chrono::Duration::seconds(120),
            Some("haiku-general"),
            "direct",
        ))
        .unwrap();

        let tracking = track_invocation(&log, &project(), "haiku-general", None, t);
        assert_eq!(tracked_status(&tracking.event), ComplianceStatus::Unknown);
        match &tracking.event {
            Event::RequestTracking {
                routing_decision,
                request_hash,
                ..
            } => {
                assert_eq!(routing_decision, "none");
                assert!(request_hash.is_none());
            },
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_most_recent_recommendation_wins() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let t = now();
        log.append(&recommendation_at(
            t - chrono::Duration::seconds(30),
            Some("haiku-general"),
            "direct",
        ))
        .unwrap();
        log.append(&recommendation_at(
            t - chrono::Duration::seconds(5),
            Some("sonnet-general"),
            "direct",
        ))
        .unwrap();

        let tracking = track_invocation(&log, &project(), "sonnet-general", None, t);
        assert_eq!(tracked_status(&tracking.event), ComplianceStatus::Followed);
    }

    #[test]
    fn test_empty_log_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let tracking = track_invocation(&log, &project(), "haiku-general", None, now());
        assert_eq!(tracked_status(&tracking.event), ComplianceStatus::Unknown);
    }
}
