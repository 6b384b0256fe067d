//! The prompt-submit hook.
//!
//! Routes the submitted prompt, records the recommendation, frames it for
//! the host, and runs the context threshold monitor.

use std::path::Path;

use dispatch_events::{Event, Recommendation, now};
use dispatch_router::{Decision, RouteCache, Router, RoutingDecision};

use crate::context;
use crate::dispatcher::{HookOutcome, HookRuntime};
use crate::flags::SessionFlags;
use crate::input::HookInput;

pub(crate) fn run(rt: &HookRuntime, input: &HookInput) -> HookOutcome {
    let mut outcome = HookOutcome::default();
    let Some(prompt) = input.prompt.as_deref() else {
        outcome.push_stderr("[dispatch] prompt-submit payload carried no prompt".to_string());
        return outcome;
    };

    let registry = rt.registry();
    if registry.is_empty() {
        outcome.push_stderr(
            "[dispatch] no agent manifests found; only escalations are possible".to_string(),
        );
    }

    let mut router = Router::new(registry, rt.config().clone()).with_semantic_from_env();
    if let Some(cache_dir) = rt.cache_dir() {
        router = router.with_cache(RouteCache::new(cache_dir, rt.config().cache_ttl_days));
    }
    let decision = router.route(prompt);

    record_recommendation(rt, &mut outcome, &decision);
    append_routing_log(rt, &decision);
    frame_for_host(&mut outcome, &decision);
    summarize_for_user(&mut outcome, &decision);
    monitor_context(rt, input, &mut outcome);

    outcome
}

/// Plain-text operator log at `logs/routing.log`, one line per decision.
/// Best effort, and deliberately outside `retention_days`: it is small
/// and its history is troubleshooting context.
fn append_routing_log(rt: &HookRuntime, decision: &RoutingDecision) {
    use std::io::Write;

    let Some(logs_dir) = rt.logs_dir() else {
        return;
    };
    let path = logs_dir.join("routing.log");
    let lock_path = logs_dir.join("routing.log.lock");
    let line = format!(
        "{} {} {} {} {:.2} {}\n",
        now().to_rfc3339(),
        decision.request_hash,
        decision.decision,
        decision.agent.as_deref().unwrap_or("-"),
        decision.confidence,
        decision.reason
    );

    let write = || -> std::io::Result<()> {
        let _lock = dispatch_core::FileLock::exclusive(&lock_path, std::time::Duration::from_secs(2))?;
        let mut options = std::fs::OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(&path)?.write_all(line.as_bytes())
    };
    if let Err(e) = write() {
        tracing::debug!(error = %e, "routing log line skipped");
    }
}

fn record_recommendation(rt: &HookRuntime, outcome: &mut HookOutcome, decision: &RoutingDecision) {
    let Some(log) = rt.event_log() else {
        return;
    };
    let event = Event::RoutingRecommendation {
        timestamp: now(),
        request_hash: decision.request_hash.clone(),
        recommendation: Recommendation {
            agent: decision.agent.clone(),
            reason: decision.reason.clone(),
            confidence: decision.confidence,
        },
        full_analysis: serde_json::to_value(decision).unwrap_or(serde_json::Value::Null),
        project: rt.project().clone(),
    };
    if let Err(e) = log.append(&event) {
        outcome.push_stderr(format!("[dispatch] recommendation not recorded: {e}"));
    }
}

fn frame_for_host(outcome: &mut HookOutcome, decision: &RoutingDecision) {
    let json = serde_json::to_string_pretty(decision)
        .unwrap_or_else(|_| "{}".to_string());
    outcome.push_block("routing-recommendation", &json);
    outcome.push_block("current-datetime", &now().to_rfc3339());
}

fn summarize_for_user(outcome: &mut HookOutcome, decision: &RoutingDecision) {
    let line = match decision.decision {
        Decision::Direct => format!(
            "[dispatch] route → {} ({:.2}): {}",
            decision.agent.as_deref().unwrap_or("?"),
            decision.confidence,
            decision.reason
        ),
        Decision::Escalate => format!("[dispatch] escalate: {}", decision.reason),
    };
    outcome.push_stderr(line);
}

/// One warning per session when the conversation nears the context
/// window.
fn monitor_context(rt: &HookRuntime, input: &HookInput, outcome: &mut HookOutcome) {
    let Some(transcript) = input.transcript_path.as_deref() else {
        return;
    };
    let Some(state_dir) = rt.state_dir() else {
        return;
    };
    let flags = SessionFlags::load(&state_dir);
    if flags.context_threshold_warned {
        return;
    }
    let estimated = context::estimate_tokens(Path::new(transcript));
    if !context::over_threshold(estimated) {
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let percent = (estimated as f64 / context::CONTEXT_WINDOW_TOKENS as f64) * 100.0;
    outcome.push_stderr(format!(
        "[dispatch] conversation has used ≈{percent:.0}% of the context window"
    ));
    let advisory = serde_json::json!({
        "estimated_tokens": estimated,
        "window_tokens": context::CONTEXT_WINDOW_TOKENS,
        "suggestion": "offer to draft a continuation prompt before context runs out",
    });
    outcome.push_block(
        "context-usage-warning",
        &serde_json::to_string_pretty(&advisory).unwrap_or_default(),
    );

    SessionFlags {
        context_threshold_warned: true,
    }
    .store(&state_dir);
}
