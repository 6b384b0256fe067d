//! Report shapes and rendering.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use dispatch_events::ComplianceStatus;

/// Compliance tallies for one slice of the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComplianceCounts {
    /// Invocations matching their recommendation.
    pub followed: u64,
    /// Invocations contradicting their recommendation.
    pub ignored: u64,
    /// Recommendations carrying no agent directive.
    pub no_directive: u64,
    /// Invocations with no recommendation in the window.
    pub unknown: u64,
}

impl ComplianceCounts {
    /// Record one tracking outcome.
    pub fn record(&mut self, status: ComplianceStatus) {
        match status {
            ComplianceStatus::Followed => self.followed += 1,
            ComplianceStatus::Ignored => self.ignored += 1,
            ComplianceStatus::NoDirective => self.no_directive += 1,
            ComplianceStatus::Unknown => self.unknown += 1,
        }
    }

    /// All tracked invocations.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.followed + self.ignored + self.no_directive + self.unknown
    }
}

/// One day of activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyReport {
    /// The day.
    pub date: NaiveDate,
    /// Every parseable record that day.
    pub total_events: u64,
    /// Routing recommendations made.
    pub recommendations: u64,
    /// Recommendations that named an agent.
    pub direct: u64,
    /// Recommendations that escalated.
    pub escalated: u64,
    /// Agent start events.
    pub agent_starts: u64,
    /// Agent stop events.
    pub agent_stops: u64,
    /// Compliance tallies for the day.
    pub compliance: ComplianceCounts,
    /// Recommendation counts per recommended agent.
    pub recommended_agents: BTreeMap<String, u64>,
    /// Free-form metric counts per solution.
    pub metrics_by_solution: BTreeMap<String, u64>,
}

impl fmt::Display for DailyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Daily report — {}", self.date)?;
        writeln!(f, "  events:           {}", self.total_events)?;
        writeln!(
            f,
            "  recommendations:  {} ({} direct, {} escalated)",
            self.recommendations, self.direct, self.escalated
        )?;
        writeln!(
            f,
            "  agent lifecycle:  {} starts, {} stops",
            self.agent_starts, self.agent_stops
        )?;
        writeln!(
            f,
            "  compliance:       {} followed, {} ignored, {} no directive, {} unknown",
            self.compliance.followed,
            self.compliance.ignored,
            self.compliance.no_directive,
            self.compliance.unknown
        )?;
        if !self.recommended_agents.is_empty() {
            writeln!(f, "  recommended agents:")?;
            for (agent, count) in &self.recommended_agents {
                writeln!(f, "    {agent:<24} {count}")?;
            }
        }
        if !self.metrics_by_solution.is_empty() {
            writeln!(f, "  metrics by solution:")?;
            for (solution, count) in &self.metrics_by_solution {
                writeln!(f, "    {solution:<24} {count}")?;
            }
        }
        Ok(())
    }
}

/// One ISO week of activity: seven daily reports plus totals.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyReport {
    /// ISO week year.
    pub year: i32,
    /// ISO week number.
    pub week: u32,
    /// The seven days, Monday first.
    pub days: Vec<DailyReport>,
}

impl WeeklyReport {
    /// Sum of recommendations across the week.
    #[must_use]
    pub fn recommendations(&self) -> u64 {
        self.days.iter().map(|d| d.recommendations).sum()
    }

    /// Sum of events across the week.
    #[must_use]
    pub fn total_events(&self) -> u64 {
        self.days.iter().map(|d| d.total_events).sum()
    }
}

impl fmt::Display for WeeklyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weekly report — {}-W{:02}", self.year, self.week)?;
        writeln!(
            f,
            "  totals: {} events, {} recommendations",
            self.total_events(),
            self.recommendations()
        )?;
        for day in &self.days {
            if day.total_events == 0 {
                continue;
            }
            writeln!(
                f,
                "  {}  {:>5} events  {:>4} recommendations",
                day.date, day.total_events, day.recommendations
            )?;
        }
        Ok(())
    }
}

/// Compliance over a date range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplianceReport {
    /// Range start (inclusive).
    pub since: NaiveDate,
    /// Range end (inclusive).
    pub until: NaiveDate,
    /// Routing recommendations in range.
    pub recommendations: u64,
    /// Tracking tallies in range.
    pub counts: ComplianceCounts,
    /// Tallies broken down by recommended agent (`(escalate)` for
    /// agentless recommendations, `(none)` when no recommendation was
    /// matched).
    pub by_agent: BTreeMap<String, ComplianceCounts>,
}

impl ComplianceReport {
    /// `followed / recommendations`; `None` when nothing was recommended.
    #[must_use]
    pub fn compliance_rate(&self) -> Option<f64> {
        if self.recommendations == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.counts.followed as f64 / self.recommendations as f64)
    }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Compliance report — {} to {}", self.since, self.until)?;
        writeln!(f, "  recommendations:  {}", self.recommendations)?;
        writeln!(
            f,
            "  tracked:          {} followed, {} ignored, {} no directive",
            self.counts.followed, self.counts.ignored, self.counts.no_directive
        )?;
        writeln!(f, "  unknown:          {}", self.counts.unknown)?;
        match self.compliance_rate() {
            Some(rate) => writeln!(f, "  compliance rate:  {:.1}%", rate * 100.0)?,
            None => writeln!(f, "  compliance rate:  n/a (no recommendations)")?,
        }
        if !self.by_agent.is_empty() {
            writeln!(f, "  by recommended agent:")?;
            for (agent, counts) in &self.by_agent {
                writeln!(
                    f,
                    "    {agent:<24} {} followed / {} ignored / {} unknown",
                    counts.followed, counts.ignored, counts.unknown
                )?;
            }
        }
        Ok(())
    }
}
