//! Client configuration and AMP wire payloads.

use serde::{Deserialize, Serialize};

use fleetsync_core::ConnectionConfig;
use fleetsync_types::models::{Instance, IntervalSchedule};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            username: "admin".to_string(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl From<&ConnectionConfig> for ClientConfig {
    fn from(connection: &ConnectionConfig) -> Self {
        Self {
            base_url: connection.url.clone(),
            username: connection.username.clone(),
            password: connection.password.clone(),
            timeout_secs: connection.timeout_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub token: &'a str,
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "sessionID", default)]
    pub session_id: String,
    #[serde(rename = "resultReason", default)]
    pub result_reason: String,
}

/// One controller target from `ADSModule/GetInstances`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct InstanceTarget {
    #[serde(default)]
    pub available_instances: Vec<Instance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct StatusPayload {
    #[serde(default)]
    pub state: i32,
}

/// `Core/AddIntervalTrigger` parameters.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddIntervalTriggerRequest<'a> {
    pub months: &'a [u32],
    pub days: &'a [u32],
    pub hours: &'a [u32],
    pub minutes: &'a [u32],
    pub days_of_month: &'a [u32],
    pub description: &'a str,
}

impl<'a> From<&'a IntervalSchedule> for AddIntervalTriggerRequest<'a> {
    fn from(schedule: &'a IntervalSchedule) -> Self {
        Self {
            months: &schedule.match_months,
            days: &schedule.match_days,
            hours: &schedule.match_hours,
            minutes: &schedule.match_minutes,
            days_of_month: &schedule.match_days_of_month,
            description: &schedule.description,
        }
    }
}
