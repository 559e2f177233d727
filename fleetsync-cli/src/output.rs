//! Shared terminal output: group header, failure lines and run summary.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use fleetsync_core::{GroupMembers, RunMode, RunSummary};

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_group(title: &str, members: &GroupMembers, mode: RunMode) {
    let mode_label = match mode {
        RunMode::DryRun => mode.label().yellow().bold(),
        RunMode::Apply => mode.label().green().bold(),
    };
    println!("{} [{}]", title.cyan().bold(), mode_label);
    println!("  Group:    {}", members.group.bold());
    println!("  Template: {}", members.template.label());
    if members.destinations.is_empty() {
        println!("  {}", "No destinations; nothing to do.".yellow());
    }
    for destination in &members.destinations {
        println!("  Destination: {}", destination.label());
    }
    for offline in &members.offline {
        println!("  {} {} (offline, skipped)", "!".yellow(), offline.label());
    }
    println!();
}

pub fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Summary".cyan().bold());
    if let Some(mode) = summary.mode {
        println!("  Mode: {}", mode.label());
    }
    println!("  Destinations: {} ({} offline)", summary.destinations, summary.offline);

    let s = &summary.settings;
    if s.aligned + s.changed + s.excluded + s.forced > 0 {
        println!(
            "  Settings: {} aligned, {} changed, {} excluded, {} forced, {} written",
            s.aligned, s.changed, s.excluded, s.forced, s.written
        );
    }
    if summary.triggers_planned_delete + summary.triggers_planned_create > 0 {
        println!(
            "  Triggers: {} deleted / {} planned, {} created / {} planned, {} task(s) added",
            summary.triggers_deleted,
            summary.triggers_planned_delete,
            summary.triggers_created,
            summary.triggers_planned_create,
            summary.tasks_added
        );
    }
    if summary.backups_kept + summary.backups_planned_delete + summary.backups_ignored > 0 {
        println!(
            "  Backups: {} kept, {} deleted / {} planned, {} ignored (non-sticky)",
            summary.backups_kept, summary.backups_deleted, summary.backups_planned_delete, summary.backups_ignored
        );
    }

    if summary.failures.is_empty() {
        println!("  {} No failures", "✓".green());
        return;
    }
    println!("  {} {} failure(s):", "✗".red(), summary.failures.len());
    for failure in &summary.failures {
        println!("    {} [{}] {}", failure.instance.bold(), failure.kind.red(), failure.message);
    }
}
