//! Control-plane trait: the seam between the reconciliation core and the
//! remote instance manager.
//!
//! Every component receives the handle explicitly (`&dyn ControlPlane`); the
//! HTTP adapter lives in `fleetsync-client`, tests substitute recording mocks.

use async_trait::async_trait;
use fleetsync_types::models::{
    AppState, BackupRecord, Instance, IntervalSchedule, ScheduleData, SettingsSpec, TaskSpec,
};
use fleetsync_types::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Low-level control-plane primitives. No diff or merge support of its own.
///
/// Methods below the read/write divider mutate remote state and are never
/// called in dry-run mode.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn list_instances(&self) -> ApiResult<Vec<Instance>>;
    async fn get_settings(&self, instance_id: &str) -> ApiResult<SettingsSpec>;
    async fn app_state(&self, instance_id: &str) -> ApiResult<AppState>;
    /// Raw (unformatted) schedule; task parameters keep their wire types.
    async fn get_schedule(&self, instance_id: &str) -> ApiResult<ScheduleData>;
    async fn get_interval_trigger(
        &self,
        instance_id: &str,
        trigger_id: &str,
    ) -> ApiResult<IntervalSchedule>;
    async fn get_backups(&self, instance_id: &str) -> ApiResult<Vec<BackupRecord>>;

    // ---- mutating ----

    async fn set_setting(&self, instance_id: &str, node: &str, value: &str) -> ApiResult<()>;
    async fn stop_app(&self, instance_id: &str) -> ApiResult<()>;
    async fn start_app(&self, instance_id: &str) -> ApiResult<()>;
    async fn delete_trigger(&self, instance_id: &str, trigger_id: &str) -> ApiResult<()>;
    /// Returns the id of the newly created trigger.
    async fn add_interval_trigger(
        &self,
        instance_id: &str,
        schedule: &IntervalSchedule,
    ) -> ApiResult<String>;
    /// Instantiates the available event `event_id`; returns the new trigger id.
    async fn add_event_trigger(&self, instance_id: &str, event_id: &str) -> ApiResult<String>;
    async fn add_task(&self, instance_id: &str, trigger_id: &str, task: &TaskSpec)
        -> ApiResult<()>;
    async fn delete_task(&self, instance_id: &str, trigger_id: &str, task_id: &str)
        -> ApiResult<()>;
    async fn set_trigger_enabled(
        &self,
        instance_id: &str,
        trigger_id: &str,
        enabled: bool,
    ) -> ApiResult<()>;
    async fn delete_backup(&self, instance_id: &str, backup_id: &str) -> ApiResult<()>;
}
