//! `dispatch validate` — doctor-style checks for layout, permissions,
//! and configuration. Exit 0 iff every check passes; optional files that
//! are simply absent pass.

use std::path::Path;

use colored::Colorize;
use dispatch_agents::AgentDefinition;
use dispatch_core::{DataDirKind, ROUTER_CONFIG_FILE, RouterConfig, SETTINGS_FILE, config_candidates};

use crate::context::CommandContext;

pub(crate) fn run() -> i32 {
    let ctx = match CommandContext::resolve() {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("dispatch: {e}");
            return 1;
        },
    };

    println!(
        "{} {} ({})",
        "validating".bold(),
        ctx.project.name,
        ctx.project.id
    );
    let mut ok = true;

    // Directory layout and permissions.
    for kind in DataDirKind::ALL {
        let path = ctx.data_root.project_dir_path(&ctx.project.id, kind);
        if !path.is_dir() {
            ok &= report(false, &format!("{kind} directory missing: {}", path.display()));
            continue;
        }
        let mut passed = true;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Ok(metadata) = std::fs::metadata(&path) {
                let mode = metadata.permissions().mode() & 0o777;
                if mode != 0o700 {
                    ok &= report(
                        false,
                        &format!("{kind} directory has mode {mode:o}, expected 700"),
                    );
                    passed = false;
                }
            }
        }
        if passed {
            report(true, &format!("{kind} directory"));
        }
    }

    // Configuration files, both cascade levels.
    for path in config_candidates(ctx.config_root(), SETTINGS_FILE) {
        ok &= check_parse(&path, |content| {
            serde_json::from_str::<serde_json::Value>(content)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
    }
    for path in config_candidates(ctx.config_root(), ROUTER_CONFIG_FILE) {
        ok &= check_parse(&path, |content| {
            serde_yaml::from_str::<RouterConfig>(content)
                .map(|_| ())
                .map_err(|e| e.to_string())
        });
    }

    // Agent manifests.
    let mut agents = 0usize;
    for dir in ctx.agent_dirs() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|e| e != "yaml" && e != "yml") {
                continue;
            }
            match AgentDefinition::from_path(&path) {
                Ok(_) => agents += 1,
                Err(e) => ok &= report(false, &format!("agent manifest: {e}")),
            }
        }
    }
    if agents == 0 {
        println!("  {} no agent manifests found (only escalations possible)", "!".yellow());
    } else {
        report(true, &format!("{agents} agent manifest(s)"));
    }

    // Persisted queue state, if any.
    match ctx.work_queue().map(|q| q.status()) {
        Ok(Ok(state)) => {
            let within = state.active.len() <= state.wip_limit;
            ok &= report(
                within,
                &format!(
                    "work queue ({} active / limit {})",
                    state.active.len(),
                    state.wip_limit
                ),
            );
        },
        Ok(Err(e)) => ok &= report(false, &format!("work queue: {e}")),
        Err(e) => ok &= report(false, &format!("work queue: {e}")),
    }

    if ok {
        println!("{}", "all checks passed".green().bold());
        0
    } else {
        println!("{}", "validation failed".red().bold());
        1
    }
}

fn check_parse(path: &Path, parse: impl Fn(&str) -> Result<(), String>) -> bool {
    match std::fs::read_to_string(path) {
        Ok(content) => match parse(&content) {
            Ok(()) => report(true, &path.display().to_string()),
            Err(e) => report(false, &format!("{}: {e}", path.display())),
        },
        // Optional file, absent: fine.
        Err(_) => true,
    }
}

fn report(passed: bool, label: &str) -> bool {
    if passed {
        println!("  {} {label}", "✓".green());
    } else {
        println!("  {} {label}", "✗".red());
    }
    passed
}
