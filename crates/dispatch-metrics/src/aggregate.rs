//! Folding events into reports.

use chrono::{NaiveDate, Weekday};
use dispatch_events::{AgentLifecycle, Event, EventLog};

use crate::error::{MetricsError, MetricsResult};
use crate::report::{ComplianceCounts, ComplianceReport, DailyReport, WeeklyReport};

/// Fold one day of the log.
///
/// # Errors
///
/// Propagates event-log read failures; a missing day folds to an empty
/// report.
pub fn daily_report(log: &EventLog, date: NaiveDate) -> MetricsResult<DailyReport> {
    let mut report = DailyReport {
        date,
        ..DailyReport::default()
    };
    for event in log.read_day(date)? {
        fold_into_daily(&mut report, &event);
    }
    Ok(report)
}

/// Fold one ISO week of the log, Monday first.
///
/// # Errors
///
/// [`MetricsError::InvalidRange`] for a week that does not exist in the
/// given year; read failures as usual.
pub fn weekly_report(log: &EventLog, year: i32, week: u32) -> MetricsResult<WeeklyReport> {
    let monday = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
        .ok_or_else(|| MetricsError::InvalidRange(format!("no ISO week {year}-W{week:02}")))?;
    let mut days = Vec::with_capacity(7);
    for offset in 0..7 {
        let date = monday + chrono::Days::new(offset);
        days.push(daily_report(log, date)?);
    }
    Ok(WeeklyReport { year, week, days })
}

/// Fold compliance over an inclusive date range.
///
/// # Errors
///
/// [`MetricsError::InvalidRange`] when `since > until`; read failures as
/// usual.
pub fn compliance_report(
    log: &EventLog,
    since: NaiveDate,
    until: NaiveDate,
) -> MetricsResult<ComplianceReport> {
    if since > until {
        return Err(MetricsError::InvalidRange(format!(
            "since {since} is after until {until}"
        )));
    }
    let mut report = ComplianceReport {
        since,
        until,
        ..ComplianceReport::default()
    };
    for event in log.read_range(since, until)? {
        match event {
            Event::RoutingRecommendation { recommendation, .. } => {
                report.recommendations += 1;
                let agent = recommendation
                    .agent
                    .unwrap_or_else(|| "(escalate)".to_string());
                report.by_agent.entry(agent).or_default();
            },
            Event::RequestTracking {
                compliance_status,
                routing_agent,
                ..
            } => {
                report.counts.record(compliance_status);
                let agent = routing_agent.unwrap_or_else(|| "(none)".to_string());
                report
                    .by_agent
                    .entry(agent)
                    .or_default()
                    .record(compliance_status);
            },
            Event::AgentEvent { .. } | Event::Metric { .. } => {},
        }
    }
    Ok(report)
}

fn fold_into_daily(report: &mut DailyReport, event: &Event) {
    report.total_events += 1;
    match event {
        Event::RoutingRecommendation { recommendation, .. } => {
            report.recommendations += 1;
            match &recommendation.agent {
                Some(agent) => {
                    report.direct += 1;
                    *report.recommended_agents.entry(agent.clone()).or_insert(0) += 1;
                },
                None => report.escalated += 1,
            }
        },
        Event::RequestTracking {
            compliance_status, ..
        } => {
            report.compliance.record(*compliance_status);
        },
        Event::AgentEvent { event, .. } => match event {
            AgentLifecycle::AgentStart => report.agent_starts += 1,
            AgentLifecycle::AgentStop => report.agent_stops += 1,
        },
        Event::Metric { solution, .. } => {
            *report
                .metrics_by_solution
                .entry(solution.clone())
                .or_insert(0) += 1;
        },
    }
}

/// The number of `work_queue` completion metrics per hour over the day
/// ending at `now`, for the adaptive WIP rule.
///
/// # Errors
///
/// Propagates event-log read failures.
pub fn completion_rate(
    log: &EventLog,
    now: chrono::DateTime<chrono::FixedOffset>,
) -> MetricsResult<f64> {
    let window_start = now - chrono::Duration::hours(24);
    let mut completions = 0u64;
    let mut dates = vec![window_start.date_naive()];
    if now.date_naive() != window_start.date_naive() {
        dates.push(now.date_naive());
    }
    for date in dates {
        for event in log.read_day(date)? {
            if let Event::Metric {
                solution,
                name,
                timestamp,
                ..
            } = &event
            {
                if solution == "work_queue"
                    && name == "item_completed"
                    && *timestamp >= window_start
                    && *timestamp <= now
                {
                    completions += 1;
                }
            }
        }
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(completions as f64 / 24.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use dispatch_core::Project;
    use dispatch_events::{ActualHandler, ComplianceStatus, Recommendation, now};
    use std::path::PathBuf;

    fn project() -> Project {
        Project::from_root(PathBuf::from("/tmp/demo"))
    }

    fn recommendation(agent: Option<&str>) -> Event {
        Event::RoutingRecommendation {
            timestamp: now(),
            request_hash: "00112233aabbccdd".to_string(),
            recommendation: Recommendation {
                agent: agent.map(ToString::to_string),
                reason: "test".to_string(),
                confidence: 0.9,
            },
            full_analysis: serde_json::Value::Null,
            project: project(),
        }
    }

    fn tracking(status: ComplianceStatus, routing_agent: Option<&str>) -> Event {
        Event::RequestTracking {
            timestamp: now(),
            request_hash: Some("00112233aabbccdd".to_string()),
            routing_decision: "direct".to_string(),
            routing_agent: routing_agent.map(ToString::to_string),
            routing_confidence: Some(0.9),
            actual_handler: ActualHandler::Agent,
            agent_invoked: Some("haiku-general".to_string()),
            agent_id: None,
            compliance_status: status,
            project: project(),
            metadata: serde_json::Value::Null,
        }
    }

    fn seeded_log(dir: &std::path::Path) -> EventLog {
        let log = EventLog::new(dir);
        log.append(&recommendation(Some("haiku-general"))).unwrap();
        log.append(&recommendation(Some("haiku-general"))).unwrap();
        log.append(&recommendation(None)).unwrap();
        log.append(&tracking(ComplianceStatus::Followed, Some("haiku-general")))
            .unwrap();
        log.append(&tracking(ComplianceStatus::Ignored, Some("haiku-general")))
            .unwrap();
        log.append(&tracking(ComplianceStatus::Unknown, None)).unwrap();
        log
    }

    #[test]
    fn test_daily_report_counts() {
        let dir = tempfile::tempdir().unwrap();
        let log = seeded_log(dir.path());
        let today = now().date_naive();

        let report = daily_report(&log, today).unwrap();
        assert_eq!(report.total_events, 6);
        assert_eq!(report.recommendations, 3);
        assert_eq!(report.direct, 2);
        assert_eq!(report.escalated, 1);
        assert_eq!(report.compliance.followed, 1);
        assert_eq!(report.compliance.ignored, 1);
        assert_eq!(report.compliance.unknown, 1);
        assert_eq!(report.recommended_agents["haiku-general"], 2);
    }

    #[test]
    fn test_daily_report_empty_day() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let report = daily_report(&log, date).unwrap();
        assert_eq!(report.total_events, 0);
    }

    #[test]
    fn test_compliance_report() {
        let dir = tempfile::tempdir().unwrap();
        let log = seeded_log(dir.path());
        let today = now().date_naive();

        let report = compliance_report(&log, today, today).unwrap();
        assert_eq!(report.recommendations, 3);
        assert_eq!(report.counts.followed, 1);
        // followed / recommendations, not followed / tracked.
        let rate = report.compliance_rate().unwrap();
        assert!((rate - 1.0 / 3.0).abs() < 1e-9);
        assert!(report.by_agent.contains_key("haiku-general"));
        assert!(report.by_agent.contains_key("(escalate)"));
        assert!(report.by_agent.contains_key("(none)"));
    }

    #[test]
    fn test_compliance_report_rejects_reversed_range() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        let a = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            compliance_report(&log, a, b),
            Err(MetricsError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_weekly_report_shape() {
        let dir = tempfile::tempdir().unwrap();
        let log = seeded_log(dir.path());
        let today = now().date_naive();
        let week = today.iso_week();

        let report = weekly_report(&log, week.year(), week.week()).unwrap();
        assert_eq!(report.days.len(), 7);
        assert_eq!(report.recommendations(), 3);
    }

    #[test]
    fn test_weekly_report_invalid_week() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        assert!(matches!(
            weekly_report(&log, 2024, 60),
            Err(MetricsError::InvalidRange(_))
        ));
    }

    #[test]
    fn test_completion_rate() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path());
        for _ in 0..48 {
            log.append(&Event::Metric {
                solution: "work_queue".to_string(),
                name: "item_completed".to_string(),
                value: serde_json::json!("w-1"),
                timestamp: now(),
                project: project(),
            })
            .unwrap();
        }
        let rate = completion_rate(&log, now()).unwrap();
        assert!((rate - 2.0).abs() < f64::EPSILON);
    }
}
