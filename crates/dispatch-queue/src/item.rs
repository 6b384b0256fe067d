//! Work items and their status machine.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Waiting for capacity and dependencies.
    Queued,
    /// Being worked on.
    InProgress,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
}

impl WorkStatus {
    /// Whether the monotone state machine permits `self → to`.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Queued, Self::InProgress)
                | (Self::InProgress, Self::Completed | Self::Failed)
        )
    }

    /// Status as written to state and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of delegated work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Queue-unique identifier.
    pub id: String,
    /// What needs doing.
    pub description: String,
    /// Agent the work is destined for, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Larger runs first.
    #[serde(default)]
    pub priority: i64,
    /// Current status.
    pub status: WorkStatus,
    /// Ids that must complete before this item may start.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// When work began.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<FixedOffset>>,
    /// When work finished, either way.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<FixedOffset>>,
    /// Rough size estimate, for reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_complexity: Option<u32>,
    /// Why the item failed, on failed items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl WorkItem {
    /// A new queued item.
    #[must_use]
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            agent: None,
            priority: 0,
            status: WorkStatus::Queued,
            dependencies: Vec::new(),
            started_at: None,
            completed_at: None,
            estimated_complexity: None,
            failure_reason: None,
        }
    }

    /// Set the destination agent.
    #[must_use]
    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = Some(agent.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Set the dependency list.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set the complexity estimate.
    #[must_use]
    pub fn with_complexity(mut self, estimate: u32) -> Self {
        self.estimated_complexity = Some(estimate);
        self
    }

    /// Age of an in-progress item at `now`.
    #[must_use]
    pub fn age_at(&self, now: DateTime<FixedOffset>) -> Option<chrono::Duration> {
        self.started_at.map(|started| now - started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(WorkStatus::Queued.can_transition_to(WorkStatus::InProgress));
        assert!(WorkStatus::InProgress.can_transition_to(WorkStatus::Completed));
        assert!(WorkStatus::InProgress.can_transition_to(WorkStatus::Failed));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!WorkStatus::Queued.can_transition_to(WorkStatus::Completed));
        assert!(!WorkStatus::Queued.can_transition_to(WorkStatus::Failed));
        assert!(!WorkStatus::Completed.can_transition_to(WorkStatus::InProgress));
        assert!(!WorkStatus::Failed.can_transition_to(WorkStatus::Queued));
        assert!(!WorkStatus::InProgress.can_transition_to(WorkStatus::Queued));
        assert!(!WorkStatus::Completed.can_transition_to(WorkStatus::Failed));
    }

    #[test]
    fn test_serde_round_trip() {
        let item = WorkItem::new("w-1", "fix the flaky test")
            .with_agent("sonnet-general")
            .with_priority(5)
            .with_dependencies(vec!["w-0".to_string()])
            .with_complexity(2);
        let json = serde_json::to_string(&item).unwrap();
        let back: WorkItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_optional_fields_omitted() {
        let item = WorkItem::new("w-1", "small thing");
        let json = serde_json::to_string(&item).unwrap();
        assert!(!json.contains("started_at"));
        assert!(!json.contains("failure_reason"));
        assert!(!json.contains("dependencies"));
    }
}
