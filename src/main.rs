//! # pm-schedule
//!
//! Command-line front end for the `project_schedule` engine. Every command
//! works on one project (`--project`) inside one JSON database (`--db`),
//! acting as the user given by `--user` or `$USER`.
//!
//! ```bash
//! pm-schedule --project tower add "Foundations"
//! pm-schedule --project tower add "Excavation" --parent Foundations --start today --duration 5
//! pm-schedule --project tower indent "Pour footings"
//! pm-schedule --project tower deadline set Excavation "next fri"
//! pm-schedule --project tower summary
//! ```
//!
//! Data is stored locally in `~/.pm/schedule.json` unless `--db` says otherwise.
//! Set `RUST_LOG=debug` to see what the engine reads and writes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use project_schedule::{Database, RequestContext, SchedulingService};

pub mod cli;
pub mod cmd;

use cli::Cli;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let db = Database::load(&db_path)
        .with_context(|| format!("failed to load {}", db_path.display()))?;

    let user = cli.user.or_else(|| std::env::var("USER").ok());
    let ctx = RequestContext::from_user(user.as_deref());
    let mutating = cli.command.is_mutating();

    let mut svc = SchedulingService::new(db);
    cmd::run(&mut svc, &ctx, &cli.project, cli.command)?;

    if mutating {
        svc.store()
            .save(&db_path)
            .with_context(|| format!("failed to save {}", db_path.display()))?;
    }
    Ok(())
}

/// `~/.pm/schedule.json`, creating the directory on first use.
fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let pm_dir = PathBuf::from(home).join(".pm");
    std::fs::create_dir_all(&pm_dir)
        .with_context(|| format!("failed to create pm directory {}", pm_dir.display()))?;
    Ok(pm_dir.join("schedule.json"))
}
