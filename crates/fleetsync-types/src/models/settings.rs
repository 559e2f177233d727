//! Setting models and value comparison.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One configurable node as returned by `Core/GetSettingsSpec`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct SettingNode {
    /// Dotted node path (e.g. "GenericModule.App.UseRandomAdminPassword")
    #[serde(default)]
    pub node: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Current value in its native JSON type
    #[serde(default)]
    pub current_value: Value,
    /// Read-only nodes are never compared or written
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub requires_restart: bool,
}

/// Setting nodes grouped by settings-group key (e.g. "arksa:stadiacontroller").
pub type SettingsSpec = BTreeMap<String, Vec<SettingNode>>;

/// Node path to serialized value.
pub type SettingsMap = BTreeMap<String, String>;

/// Serialize a raw setting value the way the control plane stores it.
///
/// Returns `None` for null values, which carry nothing to compare or write.
pub fn serialize_setting_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Compare two serialized values under their native type.
///
/// Booleans compare case-insensitively, numbers numerically, everything else
/// as trimmed text.
pub fn values_equal(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    if a == b {
        return true;
    }
    let is_bool = |s: &str| s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false");
    if is_bool(a) && is_bool(b) {
        return a.eq_ignore_ascii_case(b);
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

/// Classification of one template key against a destination.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SettingStatus {
    /// Destination already holds the template value
    Aligned,
    /// Destination differs and will receive the template value
    Changed,
    /// Per-instance identity setting; never compared, never written
    Excluded,
    /// Always planned with a fixed literal, whatever the template holds
    Forced,
}

/// Per-key diff result for a (template, destination) pair. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingEntry {
    pub key: String,
    pub template_value: Option<String>,
    pub destination_value: Option<String>,
    /// Value a write would set; `None` for Excluded entries
    pub planned_value: Option<String>,
    pub status: SettingStatus,
}

impl SettingEntry {
    /// Whether applying this entry requires a `set_setting` call.
    pub fn needs_write(&self) -> bool {
        match self.status {
            SettingStatus::Changed => true,
            SettingStatus::Forced => match (&self.planned_value, &self.destination_value) {
                (Some(planned), Some(current)) => !values_equal(planned, current),
                (Some(_), None) => true,
                (None, _) => false,
            },
            SettingStatus::Aligned | SettingStatus::Excluded => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serialize_setting_value() {
        assert_eq!(serialize_setting_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(serialize_setting_value(&json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(serialize_setting_value(&json!("Island")).as_deref(), Some("Island"));
        assert_eq!(serialize_setting_value(&json!({"a": [1, 2]})).as_deref(), Some(r#"{"a":[1,2]}"#));
        assert_eq!(serialize_setting_value(&Value::Null), None);
    }

    #[test]
    fn test_values_equal_native_types() {
        assert!(values_equal("True", "true"));
        assert!(values_equal("1", "1.0"));
        assert!(values_equal(" Island ", "Island"));
        assert!(!values_equal("1", "true"));
        assert!(!values_equal("Island", "island"));
    }

    #[test]
    fn test_forced_entry_needs_write_only_on_difference() {
        let mut entry = SettingEntry {
            key: "GenericModule.App.UseRandomAdminPassword".to_string(),
            template_value: Some("true".to_string()),
            destination_value: Some("False".to_string()),
            planned_value: Some("false".to_string()),
            status: SettingStatus::Forced,
        };
        assert!(!entry.needs_write());
        entry.destination_value = Some("true".to_string());
        assert!(entry.needs_write());
    }
}
