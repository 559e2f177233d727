use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use fleetsync_core::sync::report::RetentionReport;
use fleetsync_core::sync::retention::run_retention;
use fleetsync_core::{ControlPlane, RetentionPolicy, RunMode, RunSummary};

use crate::cli::RetentionArgs;
use crate::commands::resolve_group;
use crate::output::{print_group, print_json, print_summary};

/// `backups list` (`cleanup = false`) and `backups cleanup`.
///
/// Deletion happens only for cleanup with `--apply` and without `--dry-run`.
pub async fn run(
    client: &dyn ControlPlane,
    args: &RetentionArgs,
    cleanup: bool,
    apply: bool,
    json: bool,
) -> Result<RunSummary> {
    let members = resolve_group(client, args.group.as_deref()).await?;
    let mode = RunMode::from_dry_run(!(cleanup && apply && !args.dry_run));
    let policy = RetentionPolicy {
        daily_days: args.daily_days,
        weekly_months: args.weekly_months,
        include_non_sticky: args.all_backups,
    };
    if !json {
        let title = if cleanup { "Backup cleanup" } else { "Backup retention" };
        print_group(title, &members, mode);
    }

    let report = run_retention(client, &members, &policy, cleanup, mode, Utc::now()).await;
    let summary = RunSummary::from(&report);
    if json {
        print_json(&report)?;
        return Ok(summary);
    }
    print_retention(&report);
    if cleanup && mode.is_dry_run() {
        println!("\n{}", "Nothing deleted. Re-run with --apply (and without --dry-run) to delete.".yellow());
    }
    print_summary(&summary);
    Ok(summary)
}

fn print_retention(report: &RetentionReport) {
    for instance in &report.instances {
        println!();
        println!("{}", instance.instance.label().bold());
        let plan = &instance.plan;
        if plan.keep.is_empty() && plan.delete.is_empty() && plan.ignored.is_empty() {
            println!("  {}", "No backups.".dimmed());
        } else {
            let mut rows: Vec<(&fleetsync_types::BackupRecord, Cell)> = Vec::new();
            rows.extend(plan.keep.iter().map(|b| (b, Cell::new("KEEP").fg(Color::Green))));
            rows.extend(plan.delete.iter().map(|b| (b, Cell::new("DELETE").fg(Color::Red))));
            rows.extend(plan.ignored.iter().map(|b| (b, Cell::new("ignored").fg(Color::DarkGrey))));
            rows.sort_by(|a, b| b.0.timestamp.cmp(&a.0.timestamp));

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Backup", "Taken (UTC)", "Sticky", "Size", "Action"]);
            for (backup, action) in rows {
                let name = if backup.name.is_empty() { &backup.id } else { &backup.name };
                table.add_row(vec![
                    Cell::new(name),
                    Cell::new(backup.timestamp.format("%Y-%m-%d %H:%M")),
                    Cell::new(if backup.sticky { "yes" } else { "no" }),
                    Cell::new(format_size(backup.total_size_bytes)),
                    action,
                ]);
            }
            println!("{table}");
        }
        if instance.deleted > 0 {
            println!("  {} {} backup(s) deleted", "✓".green(), instance.deleted);
        }
        for error in &instance.errors {
            println!("  {} [{}] {}", "✗".red(), error.kind().red(), error);
        }
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS.get(unit).copied().unwrap_or("B"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512.0 B");
        assert_eq!(format_size(1_572_864), "1.5 MiB");
    }
}
