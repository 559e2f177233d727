//! Domain models for fleetsync.
//!
//! Wire-facing structs deserialize straight from raw control-plane payloads;
//! the rest are derived per run and never persisted.

mod backup;
mod de;
mod instance;
mod schedule;
mod settings;

pub use backup::{BackupRecord, RetentionPlan};
pub use de::parse_amp_timestamp;
pub use instance::{AppState, Instance};
pub use schedule::{
    AvailableTrigger, IntervalSchedule, MethodInput, MethodSpec, ScheduleData, TaskRecord,
    TaskSpec, TriggerKind, TriggerRecord, TriggerSpec,
};
pub use settings::{
    serialize_setting_value, values_equal, SettingEntry, SettingNode, SettingStatus, SettingsMap,
    SettingsSpec,
};
