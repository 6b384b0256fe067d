//! The agent-start and agent-stop hooks.

use dispatch_events::{AgentLifecycle, Event, now};

use crate::compliance;
use crate::dispatcher::{HookOutcome, HookRuntime};
use crate::input::{HookInput, sanitize};

pub(crate) fn on_start(rt: &HookRuntime, input: &HookInput) -> HookOutcome {
    let mut outcome = HookOutcome::default();
    let agent_type = sanitize(input.agent_type.as_deref().unwrap_or("unknown"));
    let agent_id = input.agent_id.as_deref().map(sanitize);
    let registry = rt.registry();
    let tier = registry.model_tier(&agent_type);
    let timestamp = now();

    if let Some(log) = rt.event_log() {
        let event = Event::AgentEvent {
            event: AgentLifecycle::AgentStart,
            timestamp,
            agent_type: agent_type.clone(),
            agent_id: agent_id.clone(),
            model_tier: tier.to_string(),
            duration_sec: None,
            project: rt.project().clone(),
        };
        if let Err(e) = log.append(&event) {
            outcome.push_stderr(format!("[dispatch] agent event not recorded: {e}"));
        }

        let tracking = compliance::track_invocation(
            &log,
            rt.project(),
            &agent_type,
            agent_id.as_deref(),
            timestamp,
        );
        if let Err(e) = log.append(&tracking.event) {
            outcome.push_stderr(format!("[dispatch] tracking event not recorded: {e}"));
        }
        if let Some(warning) = tracking.warning {
            outcome.push_stderr(format!("[dispatch] {warning}"));
        }
    }

    outcome.push_stderr(format!("[dispatch] agent {agent_type} started ({tier})"));
    outcome
}

pub(crate) fn on_stop(rt: &HookRuntime, input: &HookInput) -> HookOutcome {
    let mut outcome = HookOutcome::default();
    let agent_type = sanitize(input.agent_type.as_deref().unwrap_or("unknown"));
    let agent_id = input.agent_id.as_deref().map(sanitize);
    let registry = rt.registry();
    let tier = registry.model_tier(&agent_type);

    if let Some(log) = rt.event_log() {
        let event = Event::AgentEvent {
            event: AgentLifecycle::AgentStop,
            timestamp: now(),
            agent_type: agent_type.clone(),
            agent_id,
            model_tier: tier.to_string(),
            duration_sec: input.duration_sec,
            project: rt.project().clone(),
        };
        if let Err(e) = log.append(&event) {
            outcome.push_stderr(format!("[dispatch] agent event not recorded: {e}"));
        }
    }

    let status = input.status.as_deref().map(sanitize);
    match (status.as_deref(), input.duration_sec) {
        (Some(status), Some(duration)) => outcome.push_stderr(format!(
            "[dispatch] agent {agent_type} stopped after {duration:.1}s: {status}"
        )),
        (None, Some(duration)) => outcome.push_stderr(format!(
            "[dispatch] agent {agent_type} stopped after {duration:.1}s"
        )),
        _ => outcome.push_stderr(format!("[dispatch] agent {agent_type} stopped")),
    }
    outcome
}
