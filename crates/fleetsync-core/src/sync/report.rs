//! Run reports.
//!
//! Every component returns a report instead of printing: per-destination
//! results (plans, counts, failures) plus an overall `RunSummary` the binary
//! renders. Reports serialize to JSON for machine-readable output.

use serde::Serialize;

use fleetsync_types::models::{Instance, RetentionPlan, SettingEntry, SettingStatus};
use fleetsync_types::{SyncError, TriggerSpec};

use super::resolver::GroupMembers;
use super::schedule::plan::{DestinationPlan, SkipReason};
use super::RunMode;

/// Setting classification counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SettingsCounts {
    pub aligned: usize,
    pub changed: usize,
    pub excluded: usize,
    pub forced: usize,
    /// Values actually written
    pub written: usize,
}

impl SettingsCounts {
    fn record(&mut self, entry: &SettingEntry) {
        match entry.status {
            SettingStatus::Aligned => self.aligned += 1,
            SettingStatus::Changed => self.changed += 1,
            SettingStatus::Excluded => self.excluded += 1,
            SettingStatus::Forced => self.forced += 1,
        }
    }

    fn merge(&mut self, other: Self) {
        self.aligned += other.aligned;
        self.changed += other.changed;
        self.excluded += other.excluded;
        self.forced += other.forced;
        self.written += other.written;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsDestinationReport {
    pub destination: Instance,
    pub entries: Vec<SettingEntry>,
    pub applied: usize,
    pub error: Option<SyncError>,
}

impl SettingsDestinationReport {
    pub fn new(destination: &Instance) -> Self {
        Self { destination: destination.clone(), entries: Vec::new(), applied: 0, error: None }
    }

    pub fn counts(&self) -> SettingsCounts {
        let mut counts = SettingsCounts { written: self.applied, ..Default::default() };
        self.entries.iter().for_each(|e| counts.record(e));
        counts
    }

    /// Entries a write would touch.
    pub fn pending(&self) -> impl Iterator<Item = &SettingEntry> {
        self.entries.iter().filter(|e| e.needs_write())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsReport {
    pub group: String,
    pub template: Instance,
    pub mode: RunMode,
    /// Template values selected by the policy
    pub template_keys: usize,
    pub destinations: Vec<SettingsDestinationReport>,
    pub offline: Vec<Instance>,
}

impl SettingsReport {
    pub fn new(members: &GroupMembers, mode: RunMode, template_keys: usize) -> Self {
        Self {
            group: members.group.clone(),
            template: members.template.clone(),
            mode,
            template_keys,
            destinations: Vec::new(),
            offline: members.offline.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDestinationReport {
    pub destination: Instance,
    pub plan: DestinationPlan,
    pub deleted: usize,
    pub created: usize,
    pub tasks_added: usize,
    pub errors: Vec<SyncError>,
}

impl ScheduleDestinationReport {
    pub fn new(destination: &Instance) -> Self {
        Self {
            destination: destination.clone(),
            plan: DestinationPlan::default(),
            deleted: 0,
            created: 0,
            tasks_added: 0,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub group: String,
    pub template: Instance,
    pub mode: RunMode,
    pub template_triggers: Vec<TriggerSpec>,
    pub destinations: Vec<ScheduleDestinationReport>,
    pub offline: Vec<Instance>,
}

impl ScheduleReport {
    pub fn new(members: &GroupMembers, mode: RunMode, template_triggers: Vec<TriggerSpec>) -> Self {
        Self {
            group: members.group.clone(),
            template: members.template.clone(),
            mode,
            template_triggers,
            destinations: Vec::new(),
            offline: members.offline.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InstanceRetention {
    pub instance: Instance,
    pub plan: RetentionPlan,
    pub deleted: usize,
    pub errors: Vec<SyncError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetentionReport {
    pub group: String,
    pub mode: RunMode,
    /// Deletions were requested (cleanup) rather than a listing
    pub cleanup: bool,
    pub instances: Vec<InstanceRetention>,
    pub offline: Vec<Instance>,
}

/// One per-destination failure line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub instance: String,
    pub kind: &'static str,
    pub message: String,
}

impl Failure {
    fn new(instance: &Instance, error: &SyncError) -> Self {
        Self { instance: instance.label(), kind: error.kind(), message: error.to_string() }
    }
}

/// Overall counts across a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: Option<RunMode>,
    pub destinations: usize,
    pub offline: usize,
    pub settings: SettingsCounts,
    pub triggers_deleted: usize,
    pub triggers_created: usize,
    /// Planned deletions/creations in dry-run
    pub triggers_planned_delete: usize,
    pub triggers_planned_create: usize,
    pub tasks_added: usize,
    pub backups_kept: usize,
    pub backups_deleted: usize,
    pub backups_planned_delete: usize,
    pub backups_ignored: usize,
    pub failures: Vec<Failure>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl From<&SettingsReport> for RunSummary {
    fn from(report: &SettingsReport) -> Self {
        let mut summary = Self {
            mode: Some(report.mode),
            destinations: report.destinations.len(),
            offline: report.offline.len(),
            ..Default::default()
        };
        for dest in &report.destinations {
            summary.settings.merge(dest.counts());
            if let Some(error) = &dest.error {
                summary.failures.push(Failure::new(&dest.destination, error));
            }
        }
        summary
    }
}

impl From<&ScheduleReport> for RunSummary {
    fn from(report: &ScheduleReport) -> Self {
        let mut summary = Self {
            mode: Some(report.mode),
            destinations: report.destinations.len(),
            offline: report.offline.len(),
            ..Default::default()
        };
        for dest in &report.destinations {
            summary.triggers_deleted += dest.deleted;
            summary.triggers_created += dest.created;
            summary.tasks_added += dest.tasks_added;
            summary.triggers_planned_delete += dest.plan.deletions.len();
            summary.triggers_planned_create += dest.plan.creations.len();
            summary
                .failures
                .extend(dest.errors.iter().map(|e| Failure::new(&dest.destination, e)));
        }
        summary
    }
}

impl From<&RetentionReport> for RunSummary {
    fn from(report: &RetentionReport) -> Self {
        let mut summary = Self {
            mode: Some(report.mode),
            destinations: report.instances.len(),
            offline: report.offline.len(),
            ..Default::default()
        };
        for instance in &report.instances {
            summary.backups_kept += instance.plan.keep.len();
            summary.backups_planned_delete += instance.plan.delete.len();
            summary.backups_ignored += instance.plan.ignored.len();
            summary.backups_deleted += instance.deleted;
            summary
                .failures
                .extend(instance.errors.iter().map(|e| Failure::new(&instance.instance, e)));
        }
        summary
    }
}

/// Human-readable reason for a skipped trigger.
pub fn skip_reason_label(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::MinutesExhausted => "no free backup minute",
        SkipReason::NoMatchingEvent => "no matching event trigger on destination",
    }
}
