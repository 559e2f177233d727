//! Lenient deserializers for control-plane payloads.
//!
//! The API is not consistent about scalar encodings across versions: ids come
//! back as strings or numbers, enabled flags as booleans, numbers or enum
//! names, task lists as arrays or id-keyed objects.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected string or number, got {other}"))),
    }
}

pub(crate) fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "enabled" | "1"),
        _ => false,
    })
}

pub(crate) fn list_or_map<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items: Vec<Value> = match Value::deserialize(deserializer)? {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => return Err(de::Error::custom(format!("expected list or map, got {other}"))),
    };
    items.into_iter().map(|v| serde_json::from_value(v).map_err(de::Error::custom)).collect()
}

/// Parse a controller timestamp: RFC 3339, naive ISO (assumed UTC) or `/Date(<millis>)/`.
pub fn parse_amp_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Some(inner) = raw.strip_prefix("/Date(").and_then(|s| s.strip_suffix(")/")) {
        // Optional "+0000" style offset after the millis is ignored; millis are UTC.
        let digits_end = inner
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '+' || *c == '-')
            .map_or(inner.len(), |(i, _)| i);
        let millis: i64 = inner.get(..digits_end)?.parse().ok()?;
        return Utc.timestamp_millis_opt(millis).single();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub(crate) fn amp_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_amp_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ms_date() {
        let ts = parse_amp_timestamp("/Date(1704067200000)/").expect("valid");
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        let with_offset = parse_amp_timestamp("/Date(1704067200000+0000)/").expect("valid");
        assert_eq!(with_offset, ts);
    }

    #[test]
    fn test_parse_iso_variants() {
        let rfc = parse_amp_timestamp("2024-01-02T10:30:00Z").expect("valid");
        let naive = parse_amp_timestamp("2024-01-02T10:30:00").expect("valid");
        assert_eq!(rfc, naive);
        assert!(parse_amp_timestamp("yesterday").is_none());
    }
}
