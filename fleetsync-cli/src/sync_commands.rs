use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};

use fleetsync_core::sync::report::{skip_reason_label, ScheduleReport, SettingsReport};
use fleetsync_core::sync::schedule::plan::TriggerAction;
use fleetsync_core::sync::schedule::replicate_schedules;
use fleetsync_core::sync::settings;
use fleetsync_core::{AppConfig, ControlPlane, RunMode, RunSummary};
use fleetsync_types::models::SettingStatus;

use crate::cli::SyncArgs;
use crate::commands::resolve_group;
use crate::output::{print_group, print_json, print_summary};

pub async fn sync_settings(
    client: &dyn ControlPlane,
    config: &AppConfig,
    args: &SyncArgs,
    json: bool,
) -> Result<RunSummary> {
    let members = resolve_group(client, args.group.as_deref()).await?;
    let mode = RunMode::from_dry_run(args.dry_run);
    if !json {
        print_group("Game settings sync", &members, mode);
    }

    let report = settings::sync_settings(client, &members, &config.settings, mode).await?;
    let summary = RunSummary::from(&report);
    if json {
        print_json(&report)?;
    } else {
        print_settings(&report);
        print_summary(&summary);
    }
    Ok(summary)
}

fn print_settings(report: &SettingsReport) {
    println!("Template values selected: {}", report.template_keys);
    for dest in &report.destinations {
        println!();
        println!("{}", dest.destination.label().bold());
        if let Some(error) = &dest.error {
            if dest.entries.is_empty() {
                println!("  {} [{}] {}", "✗".red(), error.kind().red(), error);
                continue;
            }
        }

        let pending: Vec<_> = dest.pending().collect();
        if pending.is_empty() {
            println!("  {} Already aligned", "✓".green());
        } else {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Setting", "Current", "Planned", "Status"]);
            for entry in pending {
                let status = match entry.status {
                    SettingStatus::Forced => Cell::new("Forced").fg(Color::Magenta),
                    _ => Cell::new("Changed").fg(Color::Yellow),
                };
                table.add_row(vec![
                    Cell::new(&entry.key),
                    Cell::new(entry.destination_value.as_deref().unwrap_or("-")),
                    Cell::new(entry.planned_value.as_deref().unwrap_or("-")),
                    status,
                ]);
            }
            println!("{table}");
        }
        let excluded: Vec<&str> = dest
            .entries
            .iter()
            .filter(|e| e.status == SettingStatus::Excluded)
            .map(|e| e.key.as_str())
            .collect();
        if !excluded.is_empty() {
            println!("  Excluded: {}", excluded.join(", ").dimmed());
        }
        if dest.applied > 0 {
            println!("  {} {} setting(s) written", "✓".green(), dest.applied);
        }
        if let Some(error) = &dest.error {
            println!("  {} [{}] {}", "✗".red(), error.kind().red(), error);
        }
    }
}

pub async fn sync_schedules(
    client: &dyn ControlPlane,
    config: &AppConfig,
    args: &SyncArgs,
    json: bool,
) -> Result<RunSummary> {
    let members = resolve_group(client, args.group.as_deref()).await?;
    let mode = RunMode::from_dry_run(args.dry_run);
    if !json {
        print_group("Schedule replication", &members, mode);
    }

    let report = replicate_schedules(client, &members, &config.schedule, mode, Utc::now()).await?;
    let summary = RunSummary::from(&report);
    if json {
        print_json(&report)?;
    } else {
        print_schedules(&report);
        print_summary(&summary);
    }
    Ok(summary)
}

fn print_schedules(report: &ScheduleReport) {
    println!("Template triggers: {}", report.template_triggers.len());
    for dest in &report.destinations {
        println!();
        println!("{}", dest.destination.label().bold());
        for trigger in &dest.plan.deletions {
            println!("  {} delete {} '{}'", "-".red(), trigger.id, trigger.description);
        }

        if !dest.plan.creations.is_empty() {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["Trigger", "Kind", "Minutes", "Tasks", "Enabled"]);
            for planned in &dest.plan.creations {
                let minutes = match &planned.action {
                    TriggerAction::Interval(schedule) => {
                        let list: Vec<String> = schedule.match_minutes.iter().map(|m| format!("{m:02}")).collect();
                        let text = if list.is_empty() { "00".to_string() } else { list.join(",") };
                        if planned.backup_minute.is_some() {
                            Cell::new(format!("{text} (backup)")).fg(Color::Cyan)
                        } else {
                            Cell::new(text)
                        }
                    }
                    TriggerAction::Event { .. } => Cell::new("-"),
                };
                let tasks: Vec<&str> = planned.tasks.iter().map(|t| t.method.as_str()).collect();
                table.add_row(vec![
                    Cell::new(planned.description()),
                    Cell::new(format!("{:?}", planned.kind())),
                    minutes,
                    Cell::new(tasks.join("\n")),
                    Cell::new(if planned.enabled { "yes" } else { "no" }),
                ]);
            }
            println!("{table}");
        }
        for skipped in &dest.plan.skipped {
            println!(
                "  {} skipped '{}': {}",
                "!".yellow(),
                skipped.template_description,
                skip_reason_label(skipped.reason)
            );
        }
        if dest.created + dest.deleted > 0 {
            println!(
                "  {} {} deleted, {} created, {} task(s) added",
                "✓".green(),
                dest.deleted,
                dest.created,
                dest.tasks_added
            );
        }
        for error in &dest.errors {
            println!("  {} [{}] {}", "✗".red(), error.kind().red(), error);
        }
    }
}
