//! Backup retention planner.
//!
//! Two tiers: inside the daily window the newest backup of every UTC day is
//! kept, inside the weekly window the newest of every ISO week. Everything
//! older is deleted. Only sticky backups are considered unless told
//! otherwise; the controller prunes non-sticky ones itself.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use fleetsync_types::models::{BackupRecord, Instance, RetentionPlan};
use fleetsync_types::SyncError;

use super::report::{InstanceRetention, RetentionReport};
use super::resolver::GroupMembers;
use super::RunMode;
use crate::modules::control_plane::ControlPlane;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep one backup per day for this many days (default: 7)
    pub daily_days: u32,
    /// Then one per ISO week for this many calendar months (default: 3)
    pub weekly_months: u32,
    /// Also manage non-sticky backups
    pub include_non_sticky: bool,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { daily_days: 7, weekly_months: 3, include_non_sticky: false }
    }
}

/// Partition `backups` into keep/delete/ignored as of `now`.
///
/// Pure: the input is not modified and equal inputs give equal plans. Each
/// output list is ordered newest first; equal timestamps fall back to id
/// order so ties resolve the same way every run.
pub fn plan(backups: &[BackupRecord], policy: &RetentionPolicy, now: DateTime<Utc>) -> RetentionPlan {
    let daily_cutoff = now
        .checked_sub_signed(Duration::days(i64::from(policy.daily_days)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let weekly_cutoff = now
        .checked_sub_months(Months::new(policy.weekly_months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut ordered: Vec<&BackupRecord> = backups.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));

    let mut days: HashSet<NaiveDate> = HashSet::new();
    let mut weeks: HashSet<(i32, u32)> = HashSet::new();
    let mut result = RetentionPlan::default();

    for backup in ordered {
        let ts = backup.timestamp;
        let bucket = if !backup.sticky && !policy.include_non_sticky {
            &mut result.ignored
        } else if ts >= daily_cutoff {
            if days.insert(ts.date_naive()) {
                &mut result.keep
            } else {
                &mut result.delete
            }
        } else if ts >= weekly_cutoff {
            let week = ts.iso_week();
            if weeks.insert((week.year(), week.week())) {
                &mut result.keep
            } else {
                &mut result.delete
            }
        } else {
            &mut result.delete
        };
        bucket.push(backup.clone());
    }
    result
}

/// Plan retention for the template and every destination, and delete the
/// planned backups when `mode` is `Apply`.
///
/// Every instance is planned on its own; a failure on one is recorded and
/// the rest continue.
pub async fn run_retention(
    client: &dyn ControlPlane,
    members: &GroupMembers,
    policy: &RetentionPolicy,
    cleanup: bool,
    mode: RunMode,
    now: DateTime<Utc>,
) -> RetentionReport {
    tracing::info!(
        "Backup retention for group {} (daily {}d, weekly {}mo, {})",
        members.group,
        policy.daily_days,
        policy.weekly_months,
        mode.label()
    );
    let mut report = RetentionReport {
        group: members.group.clone(),
        mode,
        cleanup,
        instances: Vec::new(),
        offline: members.offline.clone(),
    };
    for instance in members.online_instances() {
        report.instances.push(retain_instance(client, instance, policy, mode, now).await);
    }
    report
}

async fn retain_instance(
    client: &dyn ControlPlane,
    instance: &Instance,
    policy: &RetentionPolicy,
    mode: RunMode,
    now: DateTime<Utc>,
) -> InstanceRetention {
    let label = instance.label();
    let mut result = InstanceRetention {
        instance: instance.clone(),
        plan: RetentionPlan::default(),
        deleted: 0,
        errors: Vec::new(),
    };

    let backups = match client.get_backups(&instance.id).await {
        Ok(backups) => backups,
        Err(e) => {
            tracing::error!("{}: failed to list backups: {}", label, e);
            result.errors.push(e.into());
            return result;
        }
    };
    result.plan = plan(&backups, policy, now);
    tracing::info!(
        "{}: keep {}, delete {}, ignored {}",
        label,
        result.plan.keep.len(),
        result.plan.delete.len(),
        result.plan.ignored.len()
    );

    if mode.is_dry_run() {
        return result;
    }
    for backup in &result.plan.delete {
        match client.delete_backup(&instance.id, &backup.id).await {
            Ok(()) => {
                result.deleted += 1;
                tracing::info!("{}: deleted backup {} ({})", label, backup.id, backup.timestamp);
            }
            Err(e) => {
                tracing::error!("{}: failed to delete backup {}: {}", label, backup.id, e);
                result.errors.push(SyncError::from(e));
            }
        }
    }
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn backup(id: &str, ts: DateTime<Utc>, sticky: bool) -> BackupRecord {
        BackupRecord {
            id: id.to_string(),
            instance_id: "ark01".to_string(),
            name: id.to_string(),
            description: String::new(),
            timestamp: ts,
            sticky,
            taken_by: "Scheduler".to_string(),
            total_size_bytes: 0,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn ids(records: &[BackupRecord]) -> Vec<&str> {
        records.iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_newest_per_day_is_kept() {
        let backups = vec![
            backup("d0", at(2024, 1, 1, 3), true),
            backup("d1", at(2024, 1, 1, 15), true),
            backup("d2", at(2024, 1, 2, 3), true),
        ];
        let result = plan(&backups, &RetentionPolicy::default(), at(2024, 1, 3, 0));
        assert_eq!(ids(&result.keep), vec!["d2", "d1"]);
        assert_eq!(ids(&result.delete), vec!["d0"]);
        assert!(result.ignored.is_empty());
    }

    #[test]
    fn test_non_sticky_ignored_unless_included() {
        let backups = vec![
            backup("s", at(2024, 1, 2, 0), true),
            backup("n", at(2024, 1, 2, 1), false),
        ];
        let now = at(2024, 1, 3, 0);
        let result = plan(&backups, &RetentionPolicy::default(), now);
        assert_eq!(ids(&result.keep), vec!["s"]);
        assert_eq!(ids(&result.ignored), vec!["n"]);

        let all = RetentionPolicy { include_non_sticky: true, ..Default::default() };
        let result = plan(&backups, &all, now);
        assert_eq!(ids(&result.keep), vec!["n"]);
        assert_eq!(ids(&result.delete), vec!["s"]);
    }

    #[test]
    fn test_weekly_tier_and_expiry() {
        let now = at(2024, 6, 30, 12);
        let backups = vec![
            // Same ISO week (2024-W22), outside the daily window.
            backup("w1", at(2024, 5, 27, 1), true),
            backup("w2", at(2024, 5, 29, 1), true),
            // Another week.
            backup("w3", at(2024, 5, 8, 1), true),
            // Older than three months.
            backup("old", at(2024, 3, 1, 1), true),
            // Inside the daily window.
            backup("today", at(2024, 6, 30, 6), true),
        ];
        let result = plan(&backups, &RetentionPolicy::default(), now);
        assert_eq!(ids(&result.keep), vec!["today", "w2", "w3"]);
        assert_eq!(ids(&result.delete), vec!["w1", "old"]);
    }

    #[test]
    fn test_plan_is_deterministic_and_input_untouched() {
        let ts = at(2024, 1, 2, 0);
        let backups = vec![backup("b", ts, true), backup("a", ts, true)];
        let snapshot = backups.clone();
        let policy = RetentionPolicy::default();
        let first = plan(&backups, &policy, at(2024, 1, 3, 0));
        assert_eq!(first, plan(&backups, &policy, at(2024, 1, 3, 0)));
        assert_eq!(backups, snapshot);
        assert_eq!(ids(&first.keep), vec!["b"]);
        assert_eq!(ids(&first.delete), vec!["a"]);
    }

    #[test]
    fn test_huge_windows_keep_everything_per_bucket() {
        let backups = vec![
            backup("new", at(2024, 1, 2, 5), true),
            backup("same-day", at(2024, 1, 2, 1), true),
            backup("ancient", at(1999, 1, 1, 0), true),
        ];
        let policy = RetentionPolicy { daily_days: u32::MAX, weekly_months: u32::MAX, ..Default::default() };
        let result = plan(&backups, &policy, at(2024, 1, 3, 0));
        assert_eq!(ids(&result.keep), vec!["new", "ancient"]);
        assert_eq!(ids(&result.delete), vec!["same-day"]);
    }
}
