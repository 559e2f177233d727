//! Per-destination replication plan: which triggers to delete, which to
//! create and with which timing, tasks and backup minute.
//!
//! Planning is pure; `super::replicate_schedules` executes the plan.

use chrono::{DateTime, Utc};
use serde::Serialize;

use fleetsync_types::models::{IntervalSchedule, ScheduleData, TaskSpec, TriggerKind, TriggerRecord};
use fleetsync_types::TriggerSpec;

use super::minutes::MinutePool;
use super::remap::remap_parameters;
use super::stamp::{is_stamped, stamp};

/// How a trigger is created on the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TriggerAction {
    /// Interval trigger with its final (stamped, possibly shifted) timing
    Interval(IntervalSchedule),
    /// Instance of the destination's available event trigger
    Event { event_id: String },
}

/// One trigger to create on a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedTrigger {
    /// Description of the template trigger this one mirrors
    pub template_description: String,
    pub action: TriggerAction,
    pub enabled: bool,
    /// Tasks in template order, parameters remapped for the destination
    pub tasks: Vec<TaskSpec>,
    /// Minute assigned to a backup interval trigger
    pub backup_minute: Option<u32>,
}

impl PlannedTrigger {
    pub fn kind(&self) -> TriggerKind {
        match self.action {
            TriggerAction::Interval(_) => TriggerKind::Interval,
            TriggerAction::Event { .. } => TriggerKind::Event,
        }
    }

    /// Description the created trigger is expected to carry.
    pub fn description(&self) -> &str {
        match &self.action {
            TriggerAction::Interval(schedule) => &schedule.description,
            TriggerAction::Event { .. } => &self.template_description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Every free backup minute is taken by earlier destinations
    MinutesExhausted,
    /// The destination offers no event trigger with the template's description
    NoMatchingEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTrigger {
    pub template_description: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DestinationPlan {
    pub deletions: Vec<TriggerRecord>,
    pub creations: Vec<PlannedTrigger>,
    pub skipped: Vec<SkippedTrigger>,
}

/// Inputs shared by every destination of one run.
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub template_name: &'a str,
    pub template_triggers: &'a [TriggerSpec],
    /// Number of destinations sharing the backup-minute pool
    pub destination_count: usize,
    pub replace_all: bool,
    pub now: DateTime<Utc>,
}

/// Destination triggers a previous replication created.
///
/// Stamped triggers are owned, and so are event triggers for events the
/// template schedules (event names cannot carry a stamp). A destination
/// without a single stamped trigger has never been synced and every
/// existing trigger is replaced.
pub fn owned_triggers<'a>(
    destination: &'a ScheduleData,
    template_triggers: &[TriggerSpec],
    replace_all: bool,
) -> Vec<&'a TriggerRecord> {
    let first_sync = !destination.populated_triggers.iter().any(|t| is_stamped(&t.description));
    if replace_all || first_sync {
        return destination.populated_triggers.iter().collect();
    }
    destination
        .populated_triggers
        .iter()
        .filter(|t| {
            is_stamped(&t.description)
                || (t.kind() == TriggerKind::Event
                    && template_triggers
                        .iter()
                        .any(|s| s.kind == TriggerKind::Event && s.description == t.description))
        })
        .collect()
}

/// Plan replication onto the destination at `index` of the run.
pub fn plan_destination(
    ctx: &PlanContext<'_>,
    destination: &ScheduleData,
    index: usize,
) -> DestinationPlan {
    let mut plan = DestinationPlan {
        deletions: owned_triggers(destination, ctx.template_triggers, ctx.replace_all)
            .into_iter()
            .cloned()
            .collect(),
        ..Default::default()
    };
    let inputs = destination.method_inputs();

    for spec in ctx.template_triggers {
        let skip = |reason| SkippedTrigger { template_description: spec.description.clone(), reason };

        let (action, backup_minute) = match spec.kind {
            TriggerKind::Interval => {
                let mut schedule = spec.interval.clone().unwrap_or_default();
                schedule.description = stamp(&spec.description, ctx.template_name, ctx.now);
                let mut assigned = None;
                if spec.backup_related {
                    let pool = MinutePool::new(&schedule, ctx.destination_count);
                    match pool.minute_for(index) {
                        Some(minute) => {
                            schedule = schedule.shifted_to_minute(minute);
                            assigned = Some(minute);
                        }
                        None => {
                            plan.skipped.push(skip(SkipReason::MinutesExhausted));
                            continue;
                        }
                    }
                }
                (TriggerAction::Interval(schedule), assigned)
            }
            TriggerKind::Event => match destination.event_named(&spec.description) {
                Some(event) => (TriggerAction::Event { event_id: event.id.clone() }, None),
                None => {
                    plan.skipped.push(skip(SkipReason::NoMatchingEvent));
                    continue;
                }
            },
        };

        let tasks = spec
            .tasks
            .iter()
            .map(|task| TaskSpec {
                method: task.method.clone(),
                parameters: remap_parameters(
                    &task.parameters,
                    inputs.get(&task.method).map(Vec::as_slice),
                ),
            })
            .collect();

        plan.creations.push(PlannedTrigger {
            template_description: spec.description.clone(),
            action,
            enabled: spec.enabled,
            tasks,
            backup_minute,
        });
    }
    plan
}
