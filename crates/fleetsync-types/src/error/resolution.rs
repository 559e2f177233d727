//! Template/destination resolution errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving a group's template and destinations.
///
/// Any of these aborts the run for the group: there is nothing to sync against.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ResolutionError {
    /// No instance carries `-TEMPLATE <group>-`
    #[error("No template found for group '{group}' (friendly name must contain '-TEMPLATE {group}-')")]
    MissingTemplate { group: String },

    /// More than one instance carries the template marker for the group
    #[error("Ambiguous template for group '{group}': {}", candidates.join(", "))]
    AmbiguousTemplate { group: String, candidates: Vec<String> },

    /// Group auto-discovery found no template marker anywhere in the fleet
    #[error("No template instance found; friendly name must match pattern '-TEMPLATE <GROUP>-'")]
    NoTemplates,
}
