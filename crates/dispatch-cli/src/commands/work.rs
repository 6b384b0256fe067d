//! `dispatch work` — manipulate the per-project queue.

use colored::Colorize;
use dispatch_events::{Event, now};
use dispatch_queue::{QueueError, WorkItem};

use crate::context::CommandContext;

/// Exit code for state transition violations.
const EXIT_TRANSITION: i32 = 3;

pub(crate) fn enqueue(
    description: &str,
    id: Option<String>,
    agent: Option<String>,
    priority: i64,
    depends_on: Vec<String>,
    complexity: Option<u32>,
) -> i32 {
    run(|ctx| {
        let id = id.unwrap_or_else(generate_id);
        let mut item = WorkItem::new(id, description).with_priority(priority);
        if let Some(agent) = agent {
            item = item.with_agent(agent);
        }
        if !depends_on.is_empty() {
            item = item.with_dependencies(depends_on);
        }
        if let Some(complexity) = complexity {
            item = item.with_complexity(complexity);
        }

        let item = ctx.work_queue()?.enqueue(item)?;
        emit_metric(ctx, "item_enqueued", &item.id);
        println!("enqueued [{}] {}", item.id, item.description);
        Ok(())
    })
}

pub(crate) fn start() -> i32 {
    run(|ctx| {
        match ctx.work_queue()?.start_next(now())? {
            Some(item) => {
                emit_metric(ctx, "item_started", &item.id);
                println!("started [{}] {}", item.id, item.description);
            },
            None => println!("nothing eligible (WIP limit reached or dependencies open)"),
        }
        Ok(())
    })
}

pub(crate) fn complete(id: &str) -> i32 {
    run(|ctx| {
        let item = ctx.work_queue()?.complete(id, now())?;
        emit_metric(ctx, "item_completed", &item.id);
        println!("completed [{}] {}", item.id, item.description);
        Ok(())
    })
}

pub(crate) fn fail(id: &str, reason: Option<String>) -> i32 {
    run(|ctx| {
        let item = ctx.work_queue()?.fail(id, reason, now())?;
        emit_metric(ctx, "item_failed", &item.id);
        match &item.failure_reason {
            Some(reason) => println!("failed [{}] {}: {reason}", item.id, item.description),
            None => println!("failed [{}] {}", item.id, item.description),
        }
        Ok(())
    })
}

pub(crate) fn status() -> i32 {
    run(|ctx| {
        let state = ctx.work_queue()?.status()?;
        println!(
            "{} {} ({})",
            "project".bold(),
            ctx.project.name,
            ctx.project.id
        );
        println!(
            "WIP {}/{}, {} queued, {} completed",
            state.active.len(),
            state.wip_limit,
            state.queued.len(),
            state.completed_ids.len()
        );
        let now = now();
        for item in &state.active {
            let age = item
                .age_at(now)
                .map_or_else(String::new, |age| format!(" ({}m)", age.num_minutes()));
            println!("  {} [{}] {}{age}", "active".green(), item.id, item.description);
        }
        for item in &state.queued {
            let blocked = if state.dependencies_satisfied(item) {
                String::new()
            } else {
                format!(" blocked by {:?}", item.dependencies)
            };
            println!(
                "  {} [{}] p{} {}{blocked}",
                "queued".yellow(),
                item.id,
                item.priority,
                item.description
            );
        }
        Ok(())
    })
}

/// Map queue errors onto the documented exit codes: 3 for transition
/// violations, 1 for everything else.
fn run(f: impl FnOnce(&CommandContext) -> anyhow::Result<()>) -> i32 {
    let ctx = match CommandContext::resolve() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("dispatch: {e}");
            return 1;
        },
    };
    match f(&ctx) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("dispatch: {e}");
            match e.downcast_ref::<QueueError>() {
                Some(QueueError::InvalidTransition { .. } | QueueError::NotFound { .. }) => {
                    EXIT_TRANSITION
                },
                _ => 1,
            }
        },
    }
}

/// Work queue activity doubles as throughput metrics for the adaptive
/// WIP rule; losing one is not worth failing the command.
fn emit_metric(ctx: &CommandContext, name: &str, item_id: &str) {
    let Ok(log) = ctx.event_log() else {
        return;
    };
    let event = Event::Metric {
        solution: "work_queue".to_string(),
        name: name.to_string(),
        value: serde_json::json!(item_id),
        timestamp: now(),
        project: ctx.project.clone(),
    };
    if let Err(e) = log.append(&event) {
        eprintln!("dispatch: metric not recorded: {e}");
    }
}

fn generate_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("w-{}", &id[..8])
}
