//! Schedule replicator.
//!
//! Mirrors the template's triggers and tasks onto every destination:
//! delete the triggers a previous replication owns, recreate each template
//! trigger (stamped, backup minute spread), add its tasks with remapped
//! parameters and mirror its enabled state. Running it twice leaves the same
//! trigger/task set as running it once.

pub mod minutes;
pub mod plan;
pub mod remap;
pub mod stamp;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleetsync_types::models::{Instance, TaskSpec, TriggerKind};
use fleetsync_types::{SyncError, TriggerSpec};

use self::plan::{plan_destination, PlanContext, PlannedTrigger, SkipReason, TriggerAction};
use self::remap::serialize_parameters;
use super::report::{ScheduleDestinationReport, ScheduleReport};
use super::resolver::GroupMembers;
use super::RunMode;
use crate::modules::control_plane::ControlPlane;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SchedulePolicy {
    /// Delete every destination trigger, not only those owned by replication
    pub replace_all_triggers: bool,
}

/// Read the template's triggers in template order, with interval timings.
pub async fn template_triggers(
    client: &dyn ControlPlane,
    template: &Instance,
) -> Result<Vec<TriggerSpec>, SyncError> {
    let schedule = client.get_schedule(&template.id).await?;
    let mut specs = Vec::with_capacity(schedule.populated_triggers.len());

    for trigger in &schedule.populated_triggers {
        let kind = trigger.kind();
        let interval = match kind {
            TriggerKind::Interval => Some(client.get_interval_trigger(&template.id, &trigger.id).await?),
            TriggerKind::Event => None,
        };
        let description = match (&interval, trigger.description.trim()) {
            (Some(timing), "") => timing.description.clone(),
            (_, description) => description.to_string(),
        };
        let tasks = trigger
            .ordered_tasks()
            .into_iter()
            .filter(|t| !t.task_method_name.trim().is_empty())
            .map(|t| TaskSpec {
                method: t.task_method_name.trim().to_string(),
                parameters: serialize_parameters(&t.parameter_mapping),
            })
            .collect();

        specs.push(TriggerSpec {
            kind,
            description,
            enabled: trigger.enabled_state,
            interval,
            tasks,
            backup_related: trigger.is_backup_related(),
        });
    }
    Ok(specs)
}

/// Replicate the template schedule onto every destination.
///
/// Fails only when the template schedule cannot be read. Failures on one
/// destination, or one trigger, are recorded and the run moves on.
pub async fn replicate_schedules(
    client: &dyn ControlPlane,
    members: &GroupMembers,
    policy: &SchedulePolicy,
    mode: RunMode,
    now: DateTime<Utc>,
) -> Result<ScheduleReport, SyncError> {
    let template = &members.template;
    tracing::info!("Replicate schedules from template {} ({})", template.label(), mode.label());

    let triggers = template_triggers(client, template).await?;
    tracing::info!("Template has {} trigger(s)", triggers.len());

    let mut report = ScheduleReport::new(members, mode, triggers);
    let ctx = PlanContext {
        template_name: &template.instance_name,
        template_triggers: &report.template_triggers,
        destination_count: members.destinations.len(),
        replace_all: policy.replace_all_triggers,
        now,
    };

    let mut results = Vec::with_capacity(members.destinations.len());
    for (index, destination) in members.destinations.iter().enumerate() {
        results.push(replicate_destination(client, &ctx, destination, index, mode).await);
    }
    report.destinations = results;
    Ok(report)
}

async fn replicate_destination(
    client: &dyn ControlPlane,
    ctx: &PlanContext<'_>,
    destination: &Instance,
    index: usize,
    mode: RunMode,
) -> ScheduleDestinationReport {
    let label = destination.label();
    let mut report = ScheduleDestinationReport::new(destination);

    let schedule = match client.get_schedule(&destination.id).await {
        Ok(schedule) => schedule,
        Err(e) => {
            tracing::error!("{}: failed to read schedule: {}", label, e);
            report.errors.push(e.into());
            return report;
        }
    };

    report.plan = plan_destination(ctx, &schedule, index);
    for skipped in &report.plan.skipped {
        match skipped.reason {
            SkipReason::MinutesExhausted => {
                let err = SyncError::MinutesExhausted {
                    destination: label.clone(),
                    trigger: skipped.template_description.clone(),
                };
                tracing::error!("{}", err);
                report.errors.push(err);
            }
            SkipReason::NoMatchingEvent => tracing::warn!(
                "{}: no event trigger '{}' on destination; skipped",
                label,
                skipped.template_description
            ),
        }
    }

    if mode.is_dry_run() {
        for trigger in &report.plan.deletions {
            tracing::info!("{}: would delete trigger {} '{}'", label, trigger.id, trigger.description);
        }
        for trigger in &report.plan.creations {
            tracing::info!("{}: would create trigger '{}'", label, trigger.description());
        }
        return report;
    }

    let mut delete_failed = false;
    for trigger in &report.plan.deletions {
        match client.delete_trigger(&destination.id, &trigger.id).await {
            Ok(()) => {
                report.deleted += 1;
                tracing::info!("{}: deleted trigger {} '{}'", label, trigger.id, trigger.description);
            }
            Err(e) => {
                tracing::error!("{}: failed to delete trigger {}: {}", label, trigger.id, e);
                report.errors.push(e.into());
                delete_failed = true;
            }
        }
    }
    // Creating on top of a trigger that could not be deleted would duplicate it.
    if delete_failed {
        tracing::warn!("{}: trigger creation skipped after failed deletions", label);
        return report;
    }

    for planned in &report.plan.creations {
        let (created, tasks_added, errors) = create_trigger(client, destination, planned).await;
        if created {
            report.created += 1;
        }
        report.tasks_added += tasks_added;
        report.errors.extend(errors);
    }
    report
}

/// Create one trigger with its tasks and enabled state.
///
/// Returns whether the trigger exists afterwards, how many tasks were added
/// and every error met along the way.
async fn create_trigger(
    client: &dyn ControlPlane,
    destination: &Instance,
    planned: &PlannedTrigger,
) -> (bool, usize, Vec<SyncError>) {
    let label = destination.label();
    let mut errors: Vec<SyncError> = Vec::new();

    let created = match &planned.action {
        TriggerAction::Interval(schedule) => client.add_interval_trigger(&destination.id, schedule).await,
        TriggerAction::Event { event_id } => client.add_event_trigger(&destination.id, event_id).await,
    };
    let trigger_id = match created {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("{}: failed to create trigger '{}': {}", label, planned.description(), e);
            errors.push(e.into());
            return (false, 0, errors);
        }
    };
    tracing::info!("{}: created trigger '{}' -> {}", label, planned.description(), trigger_id);

    if planned.kind() == TriggerKind::Event {
        errors.extend(clear_tasks(client, destination, &trigger_id).await);
    }

    let mut added = 0;
    for task in &planned.tasks {
        match client.add_task(&destination.id, &trigger_id, task).await {
            Ok(()) => added += 1,
            Err(e) => {
                tracing::error!("{}: failed to add task {}: {}", label, task.method, e);
                errors.push(e.into());
            }
        }
    }

    if let Err(e) = client.set_trigger_enabled(&destination.id, &trigger_id, planned.enabled).await {
        tracing::error!("{}: failed to set trigger {} enabled={}: {}", label, trigger_id, planned.enabled, e);
        errors.push(e.into());
    }
    (true, added, errors)
}

/// Remove the tasks the control plane auto-populates on a new event trigger.
async fn clear_tasks(client: &dyn ControlPlane, destination: &Instance, trigger_id: &str) -> Vec<SyncError> {
    let schedule = match client.get_schedule(&destination.id).await {
        Ok(schedule) => schedule,
        Err(e) => return vec![e.into()],
    };
    let Some(trigger) = schedule.trigger(trigger_id) else {
        return Vec::new();
    };

    let mut errors = Vec::new();
    for task in &trigger.tasks {
        if let Err(e) = client.delete_task(&destination.id, trigger_id, &task.id).await {
            tracing::warn!("{}: failed to clear default task {}: {}", destination.label(), task.id, e);
            errors.push(e.into());
        }
    }
    errors
}
