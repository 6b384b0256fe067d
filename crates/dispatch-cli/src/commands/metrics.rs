//! `dispatch metrics` — reports and retention.

use chrono::{Datelike, NaiveDate};
use colored::Colorize;
use dispatch_router::RouteCache;

use crate::context::CommandContext;

pub(crate) fn daily(date: Option<&str>) -> i32 {
    with_context(|ctx| {
        let date = parse_date_or_today(date)?;
        let log = ctx.event_log()?;
        let report = dispatch_metrics::daily_report(&log, date)?;
        print_header(&ctx);
        print!("{report}");
        Ok(())
    })
}

pub(crate) fn weekly(year: Option<i32>, week: Option<u32>) -> i32 {
    with_context(|ctx| {
        let today = chrono::Local::now().date_naive();
        let iso = today.iso_week();
        let year = year.unwrap_or_else(|| iso.year());
        let week = week.unwrap_or_else(|| iso.week());
        let log = ctx.event_log()?;
        let report = dispatch_metrics::weekly_report(&log, year, week)?;
        print_header(&ctx);
        print!("{report}");
        Ok(())
    })
}

pub(crate) fn compliance(since: Option<&str>, until: Option<&str>) -> i32 {
    with_context(|ctx| {
        let until = parse_date_or_today(until)?;
        let since = match since {
            Some(s) => parse_date(s)?,
            None => until - chrono::Days::new(6),
        };
        let log = ctx.event_log()?;
        let report = dispatch_metrics::compliance_report(&log, since, until)?;
        print_header(&ctx);
        print!("{report}");
        Ok(())
    })
}

pub(crate) fn cleanup(retention_days: Option<u32>) -> i32 {
    with_context(|ctx| {
        let retention = retention_days.unwrap_or(ctx.config.retention_days);
        let today = chrono::Local::now().date_naive();
        let log = ctx.event_log()?;
        let outcome = dispatch_metrics::cleanup(&log, retention, today)?;
        println!(
            "removed {} expired daily file(s) (retention {retention} days)",
            outcome.removed.len()
        );
        if !outcome.failed.is_empty() {
            eprintln!("dispatch: {} file(s) could not be removed", outcome.failed.len());
        }

        // Cache entries expire on their own TTL, not the log retention.
        if let Ok(cache_dir) = ctx.cache_dir() {
            let swept = RouteCache::new(cache_dir, ctx.config.cache_ttl_days).sweep_expired();
            if swept > 0 {
                println!("removed {swept} expired cache entr(ies)");
            }
        }
        Ok(())
    })
}

fn with_context(f: impl FnOnce(CommandContext) -> anyhow::Result<()>) -> i32 {
    match CommandContext::resolve().and_then(f) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("dispatch: {e}");
            1
        },
    }
}

fn print_header(ctx: &CommandContext) {
    println!(
        "{} {} ({})",
        "project".bold(),
        ctx.project.name,
        ctx.project.id
    );
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("bad date '{s}' (expected YYYY-MM-DD): {e}"))
}

fn parse_date_or_today(s: Option<&str>) -> anyhow::Result<NaiveDate> {
    match s {
        Some(s) => parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
