use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed project scheduling CLI.
/// Storage defaults to ~/.pm/schedule.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "pm-schedule", version, about = "Project task scheduling CLI")]
pub struct Cli {
    /// Path to the JSON schedule database.
    #[arg(long, global = true, env = "PM_SCHEDULE_DB")]
    pub db: Option<PathBuf>,

    /// Project whose schedule is read or changed.
    #[arg(long, global = true, env = "PM_SCHEDULE_PROJECT", default_value = "default")]
    pub project: String,

    /// Acting user recorded on created tasks. Falls back to $USER.
    #[arg(long, global = true, env = "PM_SCHEDULE_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
