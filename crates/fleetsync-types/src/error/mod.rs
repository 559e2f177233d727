//! Typed error definitions for fleetsync.
//!
//! This module provides a structured error hierarchy with specific error types
//! for different failure domains. All errors are designed to be:
//!
//! - **Serializable** for machine-readable run reports via serde
//! - **Displayable** for per-destination summary lines via Display
//! - **Matchable** for propagation policy via enum variants

mod api;
mod config;
mod resolution;

pub use api::ApiError;
pub use config::ConfigError;
pub use resolution::ResolutionError;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Step of the stop → write → start sequence that failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApplyStage {
    Stop,
    Write,
    Start,
}

impl fmt::Display for ApplyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Stop => "stop",
            Self::Write => "write",
            Self::Start => "start",
        };
        f.write_str(label)
    }
}

/// Unified error type for reconciliation runs.
///
/// Resolution errors abort the whole group; every other variant is scoped to
/// a single destination and reported without stopping the run.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum SyncError {
    /// Template/destination membership could not be established
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Template and destination run different applications
    #[error("Application type mismatch on {destination}: template={template_type} destination={destination_type}")]
    TypeMismatch { destination: String, template_type: String, destination_type: String },

    /// Control-plane call failed
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The application did not stop, a write failed, or it did not start again
    #[error("Apply failed on {instance} during {stage}: {message}")]
    PartialApply { instance: String, stage: ApplyStage, message: String },

    /// More destinations than free backup minutes
    #[error("No free backup minute left for {destination} (trigger '{trigger}')")]
    MinutesExhausted { destination: String, trigger: String },

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl SyncError {
    /// Short label used in per-destination summary lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "ResolutionError",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::Api(_) => "ApiError",
            Self::PartialApply { .. } => "PartialApplyFailure",
            Self::MinutesExhausted { .. } => "MinutesExhausted",
            Self::Config(_) => "ConfigError",
        }
    }
}

/// Standard Result type using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;
