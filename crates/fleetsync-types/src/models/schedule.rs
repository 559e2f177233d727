//! Schedule models: triggers, tasks and interval timing.
//!
//! Wire structs mirror the raw (unformatted) `Core/GetScheduleData` payload so
//! task parameters keep their exact keys and JSON types. `TriggerSpec` and
//! `TaskSpec` are the template-side specs the replicator recreates.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::de::{flexible_bool, list_or_map, string_or_number};

/// Full schedule of one instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleData {
    /// Event triggers the instance can instantiate
    #[serde(default, deserialize_with = "list_or_map")]
    pub available_triggers: Vec<AvailableTrigger>,
    /// Task methods the instance accepts, with their declared inputs
    #[serde(default, deserialize_with = "list_or_map")]
    pub available_methods: Vec<MethodSpec>,
    /// Triggers currently configured on the instance
    #[serde(default, deserialize_with = "list_or_map")]
    pub populated_triggers: Vec<TriggerRecord>,
}

impl ScheduleData {
    pub fn trigger(&self, id: &str) -> Option<&TriggerRecord> {
        self.populated_triggers.iter().find(|t| t.id == id)
    }

    /// Available event trigger with the given description.
    pub fn event_named(&self, description: &str) -> Option<&AvailableTrigger> {
        self.available_triggers
            .iter()
            .find(|t| t.description == description && !is_interval_type(&t.trigger_type))
    }

    /// Method id to the input names it consumes.
    pub fn method_inputs(&self) -> BTreeMap<String, Vec<String>> {
        self.available_methods
            .iter()
            .filter(|m| !m.id.trim().is_empty())
            .map(|m| {
                let names = m
                    .consumes
                    .iter()
                    .map(|c| c.name.trim().to_string())
                    .filter(|n| !n.is_empty())
                    .collect();
                (m.id.trim().to_string(), names)
            })
            .collect()
    }
}

/// Event trigger offered by the instance (e.g. "A player joins the server").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct AvailableTrigger {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, rename = "Type")]
    pub trigger_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MethodSpec {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "list_or_map")]
    pub consumes: Vec<MethodInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct MethodInput {
    #[serde(default)]
    pub name: String,
}

/// A trigger populated on an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct TriggerRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, rename = "Type")]
    pub trigger_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub enabled_state: bool,
    #[serde(default, deserialize_with = "list_or_map")]
    pub tasks: Vec<TaskRecord>,
}

impl TriggerRecord {
    pub fn kind(&self) -> TriggerKind {
        if is_interval_type(&self.trigger_type) {
            TriggerKind::Interval
        } else {
            TriggerKind::Event
        }
    }

    /// Any task whose method name mentions "backup".
    pub fn is_backup_related(&self) -> bool {
        self.tasks.iter().any(TaskRecord::is_backup)
    }

    /// Tasks in execution order.
    pub fn ordered_tasks(&self) -> Vec<&TaskRecord> {
        let mut tasks: Vec<&TaskRecord> = self.tasks.iter().collect();
        tasks.sort_by_key(|t| t.order);
        tasks
    }
}

/// A task attached to a populated trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct TaskRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub task_method_name: String,
    #[serde(default)]
    pub parameter_mapping: BTreeMap<String, Value>,
    #[serde(default)]
    pub order: i64,
}

impl TaskRecord {
    pub fn is_backup(&self) -> bool {
        self.task_method_name.to_ascii_lowercase().contains("backup")
    }
}

fn is_interval_type(trigger_type: &str) -> bool {
    trigger_type.to_ascii_lowercase().contains("interval")
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriggerKind {
    Interval,
    Event,
}

/// Timing of an interval trigger (`Core/GetTimeIntervalTrigger`).
///
/// Doubles as the `Core/AddIntervalTrigger` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct IntervalSchedule {
    #[serde(default)]
    pub match_months: Vec<u32>,
    #[serde(default)]
    pub match_days: Vec<u32>,
    #[serde(default)]
    pub match_hours: Vec<u32>,
    #[serde(default)]
    pub match_minutes: Vec<u32>,
    #[serde(default)]
    pub match_days_of_month: Vec<u32>,
    #[serde(default)]
    pub description: String,
}

impl IntervalSchedule {
    /// First matched minute; an empty list fires at minute zero.
    pub fn primary_minute(&self) -> u32 {
        self.match_minutes.first().copied().unwrap_or(0)
    }

    /// Move the schedule so its primary minute becomes `minute`, shifting any
    /// other matched minutes by the same offset. Results always lie in 0..60,
    /// whatever the wire carried.
    pub fn shifted_to_minute(&self, minute: u32) -> Self {
        let target = minute % 60;
        let offset = (target + 60 - self.primary_minute() % 60) % 60;
        let mut minutes: Vec<u32> = if self.match_minutes.is_empty() {
            vec![target]
        } else {
            self.match_minutes.iter().map(|m| (m % 60 + offset) % 60).collect()
        };
        minutes.sort_unstable();
        minutes.dedup();
        Self { match_minutes: minutes, ..self.clone() }
    }
}

/// Task to add to a trigger: method id plus serialized parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSpec {
    pub method: String,
    pub parameters: BTreeMap<String, String>,
}

/// Template trigger as the replicator recreates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TriggerSpec {
    pub kind: TriggerKind,
    /// Template description (event name for event triggers)
    pub description: String,
    pub enabled: bool,
    /// Timing details; present for interval triggers
    pub interval: Option<IntervalSchedule>,
    pub tasks: Vec<TaskSpec>,
    pub backup_related: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW_SCHEDULE: &str = r#"{
        "AvailableTriggers": [
            {"Id": "e1", "Description": "The application has started", "Type": "EventTrigger"},
            {"Id": "i0", "Description": "Interval", "Type": "IntervalTrigger"}
        ],
        "AvailableMethods": [
            {"Id": "LocalFileBackupPlugin.TakeBackup", "Name": "Take a backup",
             "Consumes": [{"Name": "Title"}, {"Name": "Description"}, {"Name": "Sticky"}]}
        ],
        "PopulatedTriggers": [
            {"Id": 7, "Type": "IntervalTrigger", "Description": "Nightly backup", "EnabledState": 1,
             "Tasks": {"t2": {"Id": "t2", "TaskMethodName": "Core.Sleep", "Order": 1,
                              "ParameterMapping": {"seconds": 30}},
                       "t1": {"Id": "t1", "TaskMethodName": "LocalFileBackupPlugin.TakeBackup", "Order": 0,
                              "ParameterMapping": {"Title": "Nightly", "Sticky": true}}}}
        ]
    }"#;

    #[test]
    fn test_parse_raw_schedule() {
        let schedule: ScheduleData = serde_json::from_str(RAW_SCHEDULE).expect("valid schedule");
        let trigger = schedule.trigger("7").expect("trigger 7");
        assert_eq!(trigger.kind(), TriggerKind::Interval);
        assert!(trigger.enabled_state);
        assert!(trigger.is_backup_related());
        let ordered: Vec<&str> =
            trigger.ordered_tasks().iter().map(|t| t.task_method_name.as_str()).collect();
        assert_eq!(ordered, vec!["LocalFileBackupPlugin.TakeBackup", "Core.Sleep"]);
        assert_eq!(
            schedule.event_named("The application has started").map(|t| t.id.as_str()),
            Some("e1")
        );
        assert!(schedule.event_named("Interval").is_none());
        assert_eq!(
            schedule.method_inputs()["LocalFileBackupPlugin.TakeBackup"],
            vec!["Title", "Description", "Sticky"]
        );
    }

    #[test]
    fn test_shift_interval_minutes() {
        let schedule = IntervalSchedule { match_minutes: vec![10, 40], ..Default::default() };
        assert_eq!(schedule.shifted_to_minute(25).match_minutes, vec![25, 55]);
        assert_eq!(schedule.shifted_to_minute(5).match_minutes, vec![5, 35]);

        let empty = IntervalSchedule::default();
        assert_eq!(empty.primary_minute(), 0);
        assert_eq!(empty.shifted_to_minute(17).match_minutes, vec![17]);
    }

    #[test]
    fn test_shift_bounds_out_of_range_minutes() {
        let schedule = IntervalSchedule { match_minutes: vec![u32::MAX, 80], ..Default::default() };
        let shifted = schedule.shifted_to_minute(10);
        assert!(shifted.match_minutes.iter().all(|m| *m < 60));
        assert_eq!(shifted.match_minutes, vec![10, 15]);
        assert_eq!(schedule.shifted_to_minute(70).match_minutes, vec![10, 15]);
    }
}
