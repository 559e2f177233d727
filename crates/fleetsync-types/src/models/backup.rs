//! Backup models and retention plans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::de::{amp_timestamp, string_or_number};

/// One stored backup of an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct BackupRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Owning instance; filled in by the client, not part of the wire payload
    #[serde(default)]
    pub instance_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// When the backup was taken (wire field `Modified`)
    #[serde(rename = "Modified", alias = "CreatedAt", deserialize_with = "amp_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Sticky backups are exempt from the controller's own pruning
    #[serde(default)]
    pub sticky: bool,
    #[serde(default)]
    pub taken_by: String,
    #[serde(default)]
    pub total_size_bytes: u64,
}

/// Keep/delete partition of one instance's backups. Derived, never mutates input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RetentionPlan {
    /// Backups retained by a daily or weekly bucket, newest first
    pub keep: Vec<BackupRecord>,
    /// Backups outside every retention slot, newest first
    pub delete: Vec<BackupRecord>,
    /// Non-sticky backups left to the controller's own pruning
    pub ignored: Vec<BackupRecord>,
}

impl RetentionPlan {
    pub fn is_kept(&self, backup_id: &str) -> bool {
        self.keep.iter().any(|b| b.id == backup_id)
    }

    pub fn is_deleted(&self, backup_id: &str) -> bool {
        self.delete.iter().any(|b| b.id == backup_id)
    }
}
