//! # fleetsync Types
//!
//! Domain models and error definitions shared by every fleetsync crate.
//!
//! - **`error`** - Typed error hierarchy (resolution, API, apply, config)
//! - **`models`** - Instances, settings, schedules, backups and retention plans
//!
//! ## Architecture Role
//!
//! `fleetsync-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!             fleetsync-types (this crate)
//!                     │
//!                     ▼
//!              fleetsync-core
//!               │          │
//!               ▼          ▼
//!   fleetsync-client   fleetsync-cli
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for wire payloads and run reports
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{ApiError, ApplyStage, ConfigError, ResolutionError, Result, SyncError};

// Re-export core model types
pub use models::{
    BackupRecord, Instance, RetentionPlan, ScheduleData, SettingEntry, SettingStatus, TaskSpec,
    TriggerKind, TriggerSpec,
};
