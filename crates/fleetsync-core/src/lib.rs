//! # fleetsync Core
//!
//! Reconciliation core: keeps destination instances of a group in line with
//! the group's template instance.
//!
//! ## Architecture
//!
//! ```text
//! fleetsync-core/src/
//! ├── modules/
//! │   ├── control_plane.rs  # ControlPlane trait (the remote manager seam)
//! │   ├── config.rs         # JSON file + env configuration
//! │   └── logger.rs         # tracing subscriber init
//! └── sync/
//!     ├── resolver.rs       # template/destination discovery
//!     ├── settings.rs       # settings differ and applier
//!     ├── schedule/         # trigger/task replication, backup minutes
//!     ├── retention.rs      # two-tier backup retention
//!     └── report.rs         # per-destination results and run summary
//! ```
//!
//! The resolver runs first; settings, schedule and retention each consume its
//! `GroupMembers` plus a `&dyn ControlPlane` and never talk to each other.

#![allow(
    clippy::redundant_else,
    reason = "Explicit else blocks improve readability in complex control flow"
)]
#![allow(clippy::implicit_clone, reason = "Explicit .clone() vs .to_string() is stylistic")]
#![allow(
    clippy::derive_partial_eq_without_eq,
    reason = "Schedule payloads carry serde_json::Value which is not Eq"
)]
// Test-only lints: allow panic!, indexing, etc. in test code
#![cfg_attr(
    test,
    allow(clippy::panic, clippy::print_stdout, clippy::indexing_slicing, clippy::assertions_on_result_states)
)]

pub mod modules;
pub mod sync;

// Re-export commonly used types
pub use modules::config::{load_config, AppConfig, ConnectionConfig};
pub use modules::control_plane::{ApiResult, ControlPlane};
pub use modules::logger::init_logging;
pub use sync::report::RunSummary;
pub use sync::resolver::{FriendlyNameResolver, GroupMembers, Resolver};
pub use sync::retention::RetentionPolicy;
pub use sync::schedule::SchedulePolicy;
pub use sync::settings::SettingsPolicy;
pub use sync::RunMode;
