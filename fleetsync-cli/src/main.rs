//! fleetsync - keeps AMP game-server instances in line with their template.
//!
//! Exit status: 0 when every destination succeeded, 1 when any destination
//! reported a failure, 2 when the run could not start (configuration, login,
//! group resolution).

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

mod backup_commands;
mod cli;
mod commands;
mod instance_commands;
mod output;
mod sync_commands;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    fleetsync_core::init_logging(&cli.log_level);

    match commands::run(cli).await {
        Ok(summary) if summary.has_failures() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
