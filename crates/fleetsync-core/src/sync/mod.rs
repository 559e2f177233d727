//! Reconciliation components.
//!
//! The resolver runs first and produces `(template, [destinations])`; the
//! settings, schedule and retention components each consume that pair and a
//! control-plane handle independently.

pub mod report;
pub mod resolver;
pub mod retention;
pub mod schedule;
pub mod settings;

use serde::Serialize;

/// Dry-run performs every read and computation but no mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    DryRun,
    Apply,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::DryRun
        } else {
            Self::Apply
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DryRun => "DRY RUN",
            Self::Apply => "APPLY",
        }
    }
}
