// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod color;
mod commands;
mod context;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use context::Context;
use exit_error::ExitError;
use output::OutputFormat;
use std::path::PathBuf;

/// `EX_TEMPFAIL`: defer without double-incrementing the retry counter
/// (spec.md §6, §7).
pub const EX_TEMPFAIL: i32 = 75;

#[derive(Parser)]
#[command(name = "sv", version = env!("CARGO_PKG_VERSION"), styles = color::styles())]
struct Cli {
    /// Supervisor home directory (defaults to `$SUPERVISOR_HOME` or `~/.sv-supervisor`).
    #[arg(long, global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the supervisor directory layout and an empty database.
    Init,
    /// Show task, batch, or global status.
    Status {
        /// Task ID or batch ID (`bat-...`). Omit for global status.
        target: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List tasks, optionally filtered by state or batch.
    List {
        #[arg(long)]
        state: Option<String>,
        #[arg(long)]
        batch: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
        #[arg(long)]
        no_limit: bool,
    },
    /// Dispatch one task: write and spawn its worker scripts.
    Dispatch {
        id: String,
        #[arg(long)]
        batch: Option<String>,
    },
    /// Force a state transition (bypassing dispatch/evaluation).
    Transition {
        id: String,
        state: String,
        #[arg(long)]
        error: Option<String>,
    },
    /// Administrative reset of a terminal task back to `queued`.
    Reset { id: String },
    /// Cancel a task, or every task in a batch.
    Cancel { id: String },
    /// Emit dispatchable task rows, tab-separated.
    Next {
        batch: Option<String>,
        limit: Option<usize>,
    },
    /// Show a task's worker log sentinels and liveness.
    WorkerStatus { id: String },
    /// Re-dispatch a failed task with an optional replacement prompt.
    Reprompt {
        id: String,
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Run the self-heal decision for one failed task and apply it.
    SelfHeal { id: String },
    /// Take a timestamped database backup.
    Backup { reason: Option<String> },
    /// Restore the database from a backup file (defaults to the latest).
    Restore { file: Option<String> },
    /// Inspect or administer the circuit breaker.
    CircuitBreaker {
        #[command(subcommand)]
        action: commands::circuit_breaker::Action,
    },
    /// Install, uninstall, or report on the periodic pulse trigger.
    Cron {
        #[command(subcommand)]
        action: commands::cron::Action,
        #[arg(long, default_value_t = 5)]
        interval: u32,
        #[arg(long)]
        batch: Option<String>,
    },
    /// Run one pulse pass (dispatch + post-dispatch advancement + self-heal).
    Pulse {
        #[arg(long)]
        batch: Option<String>,
    },
    /// Run pulses on a fixed cadence until interrupted.
    Watch {
        #[arg(long)]
        repo: Option<String>,
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let root = cli.home.unwrap_or_else(context::default_root);

    let result = run(cli.command, root).await;
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            if let Some(exit_err) = err.downcast_ref::<ExitError>() {
                if !exit_err.message.is_empty() {
                    eprintln!("{}", exit_err.message);
                }
                std::process::ExitCode::from(exit_err.code as u8)
            } else {
                eprintln!("error: {err:#}");
                std::process::ExitCode::from(1)
            }
        }
    }
}

async fn run(command: Command, root: PathBuf) -> anyhow::Result<()> {
    if matches!(command, Command::Init) {
        return commands::init::run(root);
    }

    let ctx = Context::open(root)?;
    match command {
        Command::Init => unreachable!(),
        Command::Status { target, format } => commands::status::run(&ctx, target, format),
        Command::List { state, batch, format, limit, no_limit } => {
            commands::list::run(&ctx, state, batch, format, limit, no_limit)
        }
        Command::Dispatch { id, batch } => commands::dispatch::run(&ctx, &id, batch).await,
        Command::Transition { id, state, error } => commands::transition::run(&ctx, &id, &state, error).await,
        Command::Reset { id } => commands::reset::run(&ctx, &id).await,
        Command::Cancel { id } => commands::cancel::run(&ctx, &id).await,
        Command::Next { batch, limit } => commands::next::run(&ctx, batch, limit),
        Command::WorkerStatus { id } => commands::worker_status::run(&ctx, &id),
        Command::Reprompt { id, prompt } => commands::reprompt::run(&ctx, &id, prompt).await,
        Command::SelfHeal { id } => commands::self_heal::run(&ctx, &id).await,
        Command::Backup { reason } => commands::backup::run(&ctx, reason),
        Command::Restore { file } => commands::backup::restore(&ctx, file),
        Command::CircuitBreaker { action } => commands::circuit_breaker::run(&ctx, action).await,
        Command::Cron { action, interval, batch } => commands::cron::run(&ctx, action, interval, batch).await,
        Command::Pulse { batch } => commands::pulse::run_once(&ctx, batch).await,
        Command::Watch { repo, interval_secs } => commands::pulse::watch(&ctx, repo, interval_secs).await,
    }
}
