//! Dispatch CLI - routing and execution coordination for an LLM coding
//! assistant.
//!
//! The binary serves two callers: the host, which registers `dispatch
//! hook <name>` for its lifecycle events, and the operator, who uses
//! `route`, `metrics`, `work`, and `validate` directly.
//!
//! Exit codes: 0 on success, 2 for invalid routing input, 3 for work
//! queue transition violations, 1 for everything else. Hook invocations
//! always exit 0.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

use commands::{hook, metrics, route, validate, work};

/// Dispatch - request routing and execution coordination.
#[derive(Parser)]
#[command(name = "dispatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging (same as DISPATCH_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a request and print the decision as JSON.
    Route {
        /// The request text.
        request: String,
    },

    /// Reports and retention over the event log.
    Metrics {
        #[command(subcommand)]
        command: MetricsCommands,
    },

    /// Manipulate the per-project work queue.
    Work {
        #[command(subcommand)]
        command: WorkCommands,
    },

    /// Verify directory layout, permissions, and configuration.
    Validate,

    /// Run a host lifecycle hook (reads the host payload on stdin).
    Hook {
        /// Hook name: prompt-submit, agent-start, agent-stop,
        /// session-start, session-end, or pre-tool-use.
        name: String,
    },
}

#[derive(Subcommand)]
enum MetricsCommands {
    /// Print a report to stdout.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Delete daily event files older than the retention window.
    Cleanup {
        /// Retention in days (defaults to the configured value).
        #[arg(long)]
        retention_days: Option<u32>,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// One day of activity.
    Daily {
        /// Day to report (YYYY-MM-DD, default today).
        #[arg(long)]
        date: Option<String>,
    },
    /// One ISO week of activity.
    Weekly {
        /// ISO week year (default: current).
        #[arg(long)]
        year: Option<i32>,
        /// ISO week number (default: current).
        #[arg(long)]
        week: Option<u32>,
    },
    /// Compliance over a date range.
    Compliance {
        /// Range start, inclusive (YYYY-MM-DD, default: 6 days ago).
        #[arg(long)]
        since: Option<String>,
        /// Range end, inclusive (YYYY-MM-DD, default: today).
        #[arg(long)]
        until: Option<String>,
    },
}

#[derive(Subcommand)]
enum WorkCommands {
    /// Add an item to the queue.
    Enqueue {
        /// What needs doing.
        description: String,
        /// Explicit id (default: generated).
        #[arg(long)]
        id: Option<String>,
        /// Destination agent.
        #[arg(long)]
        agent: Option<String>,
        /// Priority; larger runs first.
        #[arg(long, default_value_t = 0)]
        priority: i64,
        /// Ids that must complete first (repeatable).
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        /// Rough complexity estimate.
        #[arg(long)]
        complexity: Option<u32>,
    },
    /// Start the best eligible item, if capacity allows.
    Start,
    /// Mark an in-progress item completed.
    Complete {
        /// The item id.
        id: String,
    },
    /// Mark an in-progress item failed.
    Fail {
        /// The item id.
        id: String,
        /// Why it failed.
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show the queue state.
    Status,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let code = match cli.command {
        Commands::Route { request } => route::run(&request),
        Commands::Metrics { command } => match command {
            MetricsCommands::Report { command } => match command {
                ReportCommands::Daily { date } => metrics::daily(date.as_deref()),
                ReportCommands::Weekly { year, week } => metrics::weekly(year, week),
                ReportCommands::Compliance { since, until } => {
                    metrics::compliance(since.as_deref(), until.as_deref())
                },
            },
            MetricsCommands::Cleanup { retention_days } => metrics::cleanup(retention_days),
        },
        Commands::Work { command } => match command {
            WorkCommands::Enqueue {
                description,
                id,
                agent,
                priority,
                depends_on,
                complexity,
            } => work::enqueue(&description, id, agent, priority, depends_on, complexity),
            WorkCommands::Start => work::start(),
            WorkCommands::Complete { id } => work::complete(&id),
            WorkCommands::Fail { id, reason } => work::fail(&id, reason),
            WorkCommands::Status => work::status(),
        },
        Commands::Validate => validate::run(),
        Commands::Hook { name } => hook::run(&name),
    };
    std::process::exit(code);
}

/// Logs go to stderr so hook stdout stays reserved for the host.
fn setup_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("DISPATCH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
