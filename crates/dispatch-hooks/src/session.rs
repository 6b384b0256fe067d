//! The session-start and session-end hooks.

use std::io::Write;

use dispatch_events::{Event, now};
use dispatch_queue::{WorkQueue, WorkQueueState};
use tracing::warn;

use crate::dispatcher::{HookOutcome, HookRuntime};
use crate::flags::SessionFlags;

/// Clear session flags and brief the host on open work.
pub(crate) fn on_start(rt: &HookRuntime) -> HookOutcome {
    let mut outcome = HookOutcome::default();

    let Some(state_dir) = rt.state_dir() else {
        return outcome;
    };
    SessionFlags::clear(&state_dir);

    let queue = WorkQueue::new(&state_dir);
    let state = match queue.status() {
        Ok(state) => state,
        Err(e) => {
            outcome.push_stderr(format!("[dispatch] work queue unreadable: {e}"));
            return outcome;
        },
    };

    if !state.active.is_empty() || !state.queued.is_empty() {
        outcome.push_block("work-queue-briefing", &briefing(&state));
    }
    outcome.push_stderr(format!(
        "[dispatch] session start: {} active, {} queued, WIP limit {}",
        state.active.len(),
        state.queued.len(),
        state.wip_limit
    ));

    if let Some(log) = rt.event_log() {
        let event = Event::Metric {
            solution: "session".to_string(),
            name: "session_started".to_string(),
            value: serde_json::json!({
                "active": state.active.len(),
                "queued": state.queued.len(),
            }),
            timestamp: now(),
            project: rt.project().clone(),
        };
        if let Err(e) = log.append(&event) {
            outcome.push_stderr(format!("[dispatch] session event not recorded: {e}"));
        }
    }

    outcome
}

/// Persist a session summary and retune the WIP limit.
pub(crate) fn on_end(rt: &HookRuntime) -> HookOutcome {
    let mut outcome = HookOutcome::default();
    let timestamp = now();

    let completion_rate = rt
        .event_log()
        .and_then(|log| {
            dispatch_metrics::completion_rate(&log, timestamp)
                .map_err(|e| warn!(error = %e, "completion rate unavailable"))
                .ok()
        })
        .unwrap_or(0.0);

    let mut wip_limit = None;
    let mut queue_state = None;
    if let Some(state_dir) = rt.state_dir() {
        let queue = WorkQueue::new(&state_dir);
        match queue.adjust_wip(completion_rate, timestamp) {
            Ok(limit) => wip_limit = Some(limit),
            Err(e) => outcome.push_stderr(format!("[dispatch] WIP limit not adjusted: {e}")),
        }
        queue_state = queue.status().ok();
    }

    let summary = serde_json::json!({
        "ended_at": timestamp.to_rfc3339(),
        "completion_rate_per_hour": completion_rate,
        "wip_limit": wip_limit,
        "active": queue_state.as_ref().map(|s| s.active.len()),
        "queued": queue_state.as_ref().map(|s| s.queued.len()),
    });

    if let Some(log) = rt.event_log() {
        let event = Event::Metric {
            solution: "session".to_string(),
            name: "session_summary".to_string(),
            value: summary.clone(),
            timestamp,
            project: rt.project().clone(),
        };
        if let Err(e) = log.append(&event) {
            outcome.push_stderr(format!("[dispatch] session summary not recorded: {e}"));
        }
    }

    write_memory_summary(rt, &summary);

    if let Some(limit) = wip_limit {
        outcome.push_stderr(format!(
            "[dispatch] session end: WIP limit {limit}, completion rate {completion_rate:.2}/h"
        ));
    }
    outcome
}

fn briefing(state: &WorkQueueState) -> String {
    let mut lines = vec![format!(
        "Open work: {} in progress, {} queued (WIP limit {}).",
        state.active.len(),
        state.queued.len(),
        state.wip_limit
    )];
    for item in &state.active {
        lines.push(format!("  in progress: [{}] {}", item.id, item.description));
    }
    let mut queued: Vec<_> = state.queued.iter().collect();
    queued.sort_by_key(|item| std::cmp::Reverse(item.priority));
    for item in queued.iter().take(5) {
        lines.push(format!(
            "  queued (p{}): [{}] {}",
            item.priority, item.id, item.description
        ));
    }
    if state.queued.len() > 5 {
        lines.push(format!("  … and {} more queued", state.queued.len() - 5));
    }
    lines.join("\n")
}

/// Best-effort session summary under `memory/`.
fn write_memory_summary(rt: &HookRuntime, summary: &serde_json::Value) {
    let Some(memory_dir) = rt.memory_dir() else {
        return;
    };
    let name = format!("session-{}.json", now().format("%Y%m%d-%H%M%S"));
    let path = memory_dir.join(name);
    let write = || -> std::io::Result<()> {
        let mut options = std::fs::OpenOptions::new();
        options.create(true).truncate(true).write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(
            serde_json::to_string_pretty(summary)
                .unwrap_or_default()
                .as_bytes(),
        )
    };
    if let Err(e) = write() {
        warn!(path = %path.display(), error = %e, "session summary not written to memory");
    }
}
