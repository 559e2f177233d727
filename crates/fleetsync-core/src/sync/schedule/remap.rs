//! Task parameter remapping.
//!
//! Parameter keys are not spelled consistently across instances
//! (`valuetocheck` vs `value_to_check`). Keys are matched on their
//! normalized form against the input names the destination declares for the
//! method; unknown methods fall back to a static translation table.

use serde_json::Value;
use std::collections::BTreeMap;

/// Normalized source key to the name the control plane expects.
const KEY_TRANSLATIONS: &[(&str, &str)] = &[
    ("valuetocheck", "value_to_check"),
    ("seconds", "seconds"),
    ("dirtyonly", "dirty_only"),
];

/// Lowercase, alphanumerics only.
pub fn normalize_key(key: &str) -> String {
    key.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_lowercase).collect()
}

/// Serialize a raw parameter value for `AddTask`.
pub fn serialize_parameter(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn serialize_parameters(parameters: &BTreeMap<String, Value>) -> BTreeMap<String, String> {
    parameters.iter().map(|(k, v)| (k.clone(), serialize_parameter(v))).collect()
}

/// Remap one task's parameters for the destination.
///
/// `expected` are the destination's declared inputs for the method. When at
/// least one of them matches, only the matched canonical names are sent, so
/// the control plane never sees two aliases of the same input.
pub fn remap_parameters(
    parameters: &BTreeMap<String, String>,
    expected: Option<&[String]>,
) -> BTreeMap<String, String> {
    if let Some(expected) = expected.filter(|names| !names.is_empty()) {
        let by_normalized: BTreeMap<String, &String> =
            parameters.iter().map(|(k, v)| (normalize_key(k), v)).collect();
        let remapped: BTreeMap<String, String> = expected
            .iter()
            .filter_map(|name| {
                by_normalized.get(&normalize_key(name)).map(|v| (name.clone(), (*v).clone()))
            })
            .collect();
        if !remapped.is_empty() {
            return remapped;
        }
    }

    parameters
        .iter()
        .map(|(key, value)| {
            let normalized = normalize_key(key);
            let target = KEY_TRANSLATIONS
                .iter()
                .find(|(from, _)| *from == normalized)
                .map_or_else(|| key.clone(), |(_, to)| (*to).to_string());
            (target, value.clone())
        })
        .collect()
}
