use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::collections::BTreeSet;

use fleetsync_core::sync::resolver::template_group;
use fleetsync_core::{ControlPlane, FriendlyNameResolver, Resolver, RunSummary};

use crate::output::print_json;

pub async fn list_instances(client: &dyn ControlPlane, json: bool) -> Result<RunSummary> {
    let mut instances = client.list_instances().await.context("Failed to list instances")?;
    instances.sort_by(|a, b| a.instance_name.cmp(&b.instance_name));

    if json {
        print_json(&instances)?;
        return Ok(RunSummary::default());
    }
    if instances.is_empty() {
        println!("{}", "No instances found.".yellow());
        return Ok(RunSummary::default());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Instance", "Friendly name", "Application", "Role", "State"]);
    for instance in &instances {
        let role = if instance.is_controller() {
            Cell::new("controller").fg(Color::DarkGrey)
        } else if let Some(group) = template_group(&instance.friendly_name) {
            Cell::new(format!("template {group}")).fg(Color::Cyan)
        } else {
            Cell::new("-")
        };
        let state = if instance.running {
            Cell::new("Running").fg(Color::Green)
        } else {
            Cell::new("Stopped").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&instance.instance_name),
            Cell::new(&instance.friendly_name),
            Cell::new(instance.app_type()),
            role,
            state,
        ]);
    }
    println!("{table}");
    println!("\n{} instances total", instances.len());

    let groups: BTreeSet<String> = instances
        .iter()
        .filter(|i| !i.is_controller())
        .filter_map(|i| template_group(&i.friendly_name))
        .map(|g| g.to_uppercase())
        .collect();
    let resolver = FriendlyNameResolver;
    for group in groups {
        match resolver.resolve(&instances, &group) {
            Ok(members) => println!(
                "  {} {}: template {}, {} destination(s), {} offline",
                "✓".green(),
                group.bold(),
                members.template.instance_name,
                members.destinations.len(),
                members.offline.len()
            ),
            Err(e) => println!("  {} {}: {}", "✗".red(), group.bold(), e),
        }
    }
    Ok(RunSummary::default())
}
