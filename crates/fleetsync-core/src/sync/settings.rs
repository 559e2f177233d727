//! Settings differ and applier.
//!
//! `diff` is a pure key-level comparison of template and destination values
//! under a `SettingsPolicy`. `apply` performs the stop → write → start
//! sequence for one destination and refuses to write into a running app.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use fleetsync_types::models::{
    serialize_setting_value, values_equal, Instance, SettingEntry, SettingStatus, SettingsMap,
    SettingsSpec,
};
use fleetsync_types::{ApplyStage, SyncError};

use super::report::{SettingsDestinationReport, SettingsReport};
use super::resolver::GroupMembers;
use super::RunMode;
use crate::modules::control_plane::ControlPlane;

/// Per-instance identity/location fields that must not be cloned from the template.
pub const DEFAULT_EXCLUSIONS: &[&str] = &[
    "Meta.GenericModule.SessionName",
    "Meta.GenericModule.Map",
    "Meta.GenericModule.CustomMap",
];

/// Values forced on every destination.
pub const DEFAULT_FORCED: &[(&str, &str)] = &[("GenericModule.App.UseRandomAdminPassword", "false")];

/// Node prefixes that identify game settings (as opposed to controller plumbing).
pub const DEFAULT_NODE_PREFIXES: &[&str] =
    &["GenericModule.", "steamcmdplugin.", "RCONPlugin.", "Meta.GenericModule."];

/// Which template settings are synchronized and how.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SettingsPolicy {
    /// Settings group to read template values from; all groups when unset
    pub group_key: Option<String>,
    /// Only nodes starting with one of these are synchronized; empty = all
    pub node_prefixes: Vec<String>,
    pub exclusions: BTreeSet<String>,
    pub forced: BTreeMap<String, String>,
    /// Upper bound on waiting for the app to stop before writing
    pub stop_timeout_secs: u64,
    pub stop_poll_secs: u64,
}

impl Default for SettingsPolicy {
    fn default() -> Self {
        Self {
            group_key: None,
            node_prefixes: DEFAULT_NODE_PREFIXES.iter().map(|p| p.to_string()).collect(),
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|n| n.to_string()).collect(),
            forced: DEFAULT_FORCED.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            stop_timeout_secs: 60,
            stop_poll_secs: 1,
        }
    }
}

impl SettingsPolicy {
    pub fn stop_wait(&self) -> StopWait {
        StopWait {
            timeout: Duration::from_secs(self.stop_timeout_secs),
            poll: Duration::from_secs(self.stop_poll_secs.max(1)),
        }
    }

    fn accepts_node(&self, node: &str) -> bool {
        self.node_prefixes.is_empty() || self.node_prefixes.iter().any(|p| node.starts_with(p))
    }
}

/// Bounded wait for the application to report a stopped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopWait {
    pub timeout: Duration,
    pub poll: Duration,
}

/// Writable template values selected by the policy.
pub fn template_values(spec: &SettingsSpec, policy: &SettingsPolicy) -> SettingsMap {
    let groups: Vec<_> = match &policy.group_key {
        Some(key) => spec.get(key).into_iter().collect(),
        None => spec.values().collect(),
    };
    groups
        .into_iter()
        .flatten()
        .filter(|n| !n.read_only)
        .filter(|n| !n.node.trim().is_empty() && policy.accepts_node(n.node.trim()))
        .filter_map(|n| serialize_setting_value(&n.current_value).map(|v| (n.node.trim().to_string(), v)))
        .collect()
}

/// Every writable node of an instance with its current value.
pub fn writable_values(spec: &SettingsSpec) -> SettingsMap {
    spec.values()
        .flatten()
        .filter(|n| !n.read_only && !n.node.trim().is_empty())
        .map(|n| {
            let value = serialize_setting_value(&n.current_value).unwrap_or_default();
            (n.node.trim().to_string(), value)
        })
        .collect()
}

/// Classify every template key against the destination.
///
/// Keys the destination does not expose are not writable there and are left
/// out, except Excluded keys which are always reported. Forced keys the
/// destination exposes are planned even when the template lacks them.
pub fn diff(
    template: &SettingsMap,
    destination: &SettingsMap,
    policy: &SettingsPolicy,
) -> Vec<SettingEntry> {
    let forced_keys = policy.forced.keys().filter(|k| destination.contains_key(*k));
    let keys: BTreeSet<&String> = template.keys().chain(forced_keys).collect();

    keys.into_iter()
        .filter_map(|key| {
            let template_value = template.get(key).cloned();
            let destination_value = destination.get(key).cloned();

            if policy.exclusions.contains(key) {
                return Some(SettingEntry {
                    key: key.clone(),
                    template_value,
                    destination_value,
                    planned_value: None,
                    status: SettingStatus::Excluded,
                });
            }
            let current = destination_value.as_deref()?;
            if let Some(literal) = policy.forced.get(key) {
                return Some(SettingEntry {
                    key: key.clone(),
                    template_value,
                    destination_value,
                    planned_value: Some(literal.clone()),
                    status: SettingStatus::Forced,
                });
            }
            let wanted = template_value.clone()?;
            let status = if values_equal(&wanted, current) {
                SettingStatus::Aligned
            } else {
                SettingStatus::Changed
            };
            Some(SettingEntry {
                key: key.clone(),
                template_value,
                destination_value,
                planned_value: Some(wanted),
                status,
            })
        })
        .collect()
}

/// Result of a successful apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ApplyOutcome {
    pub written: usize,
    /// App was running before and has been started again
    pub restarted: bool,
}

/// Stop the app, write every entry that needs it, start the app again.
///
/// Nothing is written unless the app is confirmed stopped. A failed write
/// stops further writes and the app is restarted before the failure is
/// reported; a failed start leaves the app stopped and is reported as such.
pub async fn apply(
    client: &dyn ControlPlane,
    instance: &Instance,
    entries: &[SettingEntry],
    wait: StopWait,
) -> Result<ApplyOutcome, SyncError> {
    let writes: Vec<&SettingEntry> = entries.iter().filter(|e| e.needs_write()).collect();
    if writes.is_empty() {
        return Ok(ApplyOutcome::default());
    }

    let label = instance.label();
    let partial = |stage: ApplyStage, message: String| SyncError::PartialApply {
        instance: label.clone(),
        stage,
        message,
    };

    let was_running = client.app_state(&instance.id).await?.is_running();
    if was_running {
        client.stop_app(&instance.id).await.map_err(|e| partial(ApplyStage::Stop, e.to_string()))?;
        tracing::info!("{}: application stop requested", label);
        if !wait_for_stop(client, &instance.id, wait).await {
            return Err(partial(
                ApplyStage::Stop,
                format!("application still running after {}s; nothing written", wait.timeout.as_secs()),
            ));
        }
        tracing::info!("{}: confirmed stopped", label);
    } else {
        tracing::info!("{}: application already stopped", label);
    }

    for (written, entry) in writes.iter().enumerate() {
        let value = entry.planned_value.as_deref().unwrap_or_default();
        if let Err(e) = client.set_setting(&instance.id, &entry.key, value).await {
            let mut message = format!("wrote {written} of {} setting(s); {}: {e}", writes.len(), entry.key);
            if was_running {
                if let Err(start_err) = client.start_app(&instance.id).await {
                    tracing::error!("{}: restart after failed write also failed: {}", label, start_err);
                    message.push_str(&format!("; restart failed, application left STOPPED: {start_err}"));
                }
            }
            return Err(partial(ApplyStage::Write, message));
        }
    }
    tracing::info!("{}: updated {} setting(s)", label, writes.len());

    if was_running {
        client.start_app(&instance.id).await.map_err(|e| {
            tracing::error!("{}: application left STOPPED, start failed: {}", label, e);
            partial(ApplyStage::Start, format!("application left stopped: {e}"))
        })?;
        tracing::info!("{}: application start requested", label);
    }

    Ok(ApplyOutcome { written: writes.len(), restarted: was_running })
}

async fn wait_for_stop(client: &dyn ControlPlane, instance_id: &str, wait: StopWait) -> bool {
    let started = tokio::time::Instant::now();
    loop {
        match client.app_state(instance_id).await {
            Ok(state) if !state.is_running() => return true,
            Ok(_) => {}
            Err(e) => tracing::debug!("Status probe failed while waiting for stop: {}", e),
        }
        if started.elapsed() >= wait.timeout {
            return false;
        }
        tokio::time::sleep(wait.poll).await;
    }
}

/// Synchronize settings from the group's template onto every destination.
///
/// Fails only when the template itself cannot be read; every destination
/// failure is recorded in the report and the run moves on.
pub async fn sync_settings(
    client: &dyn ControlPlane,
    members: &GroupMembers,
    policy: &SettingsPolicy,
    mode: RunMode,
) -> Result<SettingsReport, SyncError> {
    let template = &members.template;
    tracing::info!("Sync game settings from template {} ({})", template.label(), mode.label());

    let template_spec = client.get_settings(&template.id).await?;
    let template_map = template_values(&template_spec, policy);
    if template_map.is_empty() {
        tracing::warn!("Template {} exposes no writable settings for this policy", template.label());
    }

    let mut report = SettingsReport::new(members, mode, template_map.len());
    for destination in &members.destinations {
        let result = sync_destination(client, template, destination, &template_map, policy, mode).await;
        report.destinations.push(result);
    }
    Ok(report)
}

async fn sync_destination(
    client: &dyn ControlPlane,
    template: &Instance,
    destination: &Instance,
    template_map: &SettingsMap,
    policy: &SettingsPolicy,
    mode: RunMode,
) -> SettingsDestinationReport {
    let mut report = SettingsDestinationReport::new(destination);

    if template.app_type() != destination.app_type() {
        let err = SyncError::TypeMismatch {
            destination: destination.label(),
            template_type: template.app_type().to_string(),
            destination_type: destination.app_type().to_string(),
        };
        tracing::error!("{}", err);
        report.error = Some(err);
        return report;
    }

    let spec = match client.get_settings(&destination.id).await {
        Ok(spec) => spec,
        Err(e) => {
            tracing::error!("{}: failed to read settings: {}", destination.label(), e);
            report.error = Some(e.into());
            return report;
        }
    };
    report.entries = diff(template_map, &writable_values(&spec), policy);

    if mode.is_dry_run() {
        return report;
    }
    match apply(client, destination, &report.entries, policy.stop_wait()).await {
        Ok(outcome) => report.applied = outcome.written,
        Err(e) => {
            tracing::error!("{}", e);
            report.error = Some(e);
        }
    }
    report
}
