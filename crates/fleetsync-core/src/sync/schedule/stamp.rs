//! Replication stamps appended to trigger descriptions.
//!
//! The stamp is the only durable marker of prior sync activity: the next run
//! reads it back to decide which destination triggers it owns.

use chrono::{DateTime, Utc};

/// Separator between the base description and the stamp.
pub const STAMP_MARKER: &str = " | replicated from ";

/// Description used when the template trigger has none.
pub const DEFAULT_DESCRIPTION: &str = "Scheduled Trigger";

pub fn is_stamped(description: &str) -> bool {
    description.contains(STAMP_MARKER)
}

/// Description without any previous stamp.
pub fn strip_stamp(description: &str) -> &str {
    match description.find(STAMP_MARKER) {
        Some(idx) => description.get(..idx).unwrap_or(description).trim_end(),
        None => description.trim(),
    }
}

/// `"<base> | replicated from <template> <UTC ISO 8601>"`.
pub fn stamp(base: &str, template_name: &str, at: DateTime<Utc>) -> String {
    let base = strip_stamp(base);
    let base = if base.is_empty() { DEFAULT_DESCRIPTION } else { base };
    format!("{base}{STAMP_MARKER}{template_name} {}", at.format("%Y-%m-%dT%H:%M:%SZ"))
}
