use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::Mutex;

use fleetsync_core::{ApiResult, ControlPlane};
use fleetsync_types::models::{
    AppState, BackupRecord, Instance, IntervalSchedule, ScheduleData, SettingsSpec, TaskSpec,
};
use fleetsync_types::ApiError;

use crate::error::ClientError;
use crate::types::{
    AddIntervalTriggerRequest, ClientConfig, InstanceTarget, LoginRequest, LoginResponse,
    StatusPayload,
};

pub struct AmpClient {
    client: Client,
    config: ClientConfig,
    session: Mutex<Option<String>>,
    /// Instance id to session id
    instance_sessions: Mutex<HashMap<String, String>>,
}

impl AmpClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let parsed = url::Url::parse(&config.base_url).map_err(|e| ClientError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidUrl {
                url: config.base_url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        let config = ClientConfig { base_url: config.base_url.trim_end_matches('/').to_string(), ..config };
        Ok(Self {
            client,
            config,
            session: Mutex::new(None),
            instance_sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Log in to the controller. Called lazily by every controller call.
    pub async fn login(&self) -> ApiResult<()> {
        let session = self.open_session(&self.controller_url("Core/Login"), "controller").await?;
        *self.session.lock().await = Some(session);
        tracing::info!("Logged in to {} as {}", self.config.base_url, self.config.username);
        Ok(())
    }

    fn controller_url(&self, endpoint: &str) -> String {
        format!("{}/API/{}", self.config.base_url, endpoint)
    }

    fn instance_url(&self, instance_id: &str, endpoint: &str) -> String {
        format!("{}/API/ADSModule/Servers/{}/API/{}", self.config.base_url, instance_id, endpoint)
    }

    async fn open_session(&self, url: &str, target: &str) -> ApiResult<String> {
        let request = LoginRequest {
            username: &self.config.username,
            password: &self.config.password,
            token: "",
            remember_me: false,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ApiError::invalid_payload("Core/Login", e.to_string()))?;
        let value = self.post(url, "Core/Login", body).await?;
        let login: LoginResponse = decode("Core/Login", value)?;
        if !login.success || login.session_id.is_empty() {
            let reason =
                if login.result_reason.is_empty() { "login refused".to_string() } else { login.result_reason };
            return Err(ApiError::Authentication { target: target.to_string(), reason });
        }
        Ok(login.session_id)
    }

    async fn controller_session(&self) -> ApiResult<String> {
        if let Some(session) = self.session.lock().await.clone() {
            return Ok(session);
        }
        self.login().await?;
        self.session.lock().await.clone().ok_or_else(|| ApiError::Authentication {
            target: "controller".to_string(),
            reason: "no session after login".to_string(),
        })
    }

    async fn instance_session(&self, instance_id: &str) -> ApiResult<String> {
        if let Some(session) = self.instance_sessions.lock().await.get(instance_id) {
            return Ok(session.clone());
        }
        // The instance login is routed through the controller, which needs its own session.
        self.controller_session().await?;
        let session = self
            .open_session(&self.instance_url(instance_id, "Core/Login"), &format!("instance {instance_id}"))
            .await?;
        tracing::debug!("Opened session for instance {}", instance_id);
        self.instance_sessions.lock().await.insert(instance_id.to_string(), session.clone());
        Ok(session)
    }

    /// Call a controller endpoint.
    pub async fn call(&self, endpoint: &str, params: Value) -> ApiResult<Value> {
        let session = self.controller_session().await?;
        self.post(&self.controller_url(endpoint), endpoint, with_session(params, &session)).await
    }

    /// Call an endpoint on one instance.
    pub async fn call_instance(&self, instance_id: &str, endpoint: &str, params: Value) -> ApiResult<Value> {
        let session = self.instance_session(instance_id).await?;
        self.post(&self.instance_url(instance_id, endpoint), endpoint, with_session(params, &session)).await
    }

    async fn post(&self, url: &str, endpoint: &str, body: Value) -> ApiResult<Value> {
        let resp = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::Transport { endpoint: endpoint.to_string(), message: e.to_string() })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Transport { endpoint: endpoint.to_string(), message: e.to_string() })?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Authentication { target: endpoint.to_string(), reason: text });
        }
        if !status.is_success() {
            return Err(ApiError::Status { endpoint: endpoint.to_string(), status: status.as_u16(), message: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ApiError::invalid_payload(endpoint, format!("not JSON: {e}")))?;
        unwrap_response(endpoint, value)
    }

    async fn schedule_trigger_ids(&self, instance_id: &str) -> ApiResult<(ScheduleData, HashSet<String>)> {
        let schedule = self.get_schedule(instance_id).await?;
        let ids = schedule.populated_triggers.iter().map(|t| t.id.clone()).collect();
        Ok((schedule, ids))
    }

    /// Run a trigger-creating call and return the id of the trigger it created.
    ///
    /// The API does not return it: the populated trigger ids before and after
    /// the call are compared, preferring a new trigger with the expected
    /// description.
    async fn create_trigger(
        &self,
        instance_id: &str,
        endpoint: &str,
        params: Value,
        before: &HashSet<String>,
        expected_description: &str,
    ) -> ApiResult<String> {
        self.call_instance(instance_id, endpoint, params).await?;
        let (after, _) = self.schedule_trigger_ids(instance_id).await?;
        let created: Vec<_> = after.populated_triggers.iter().filter(|t| !before.contains(&t.id)).collect();

        created
            .iter()
            .find(|t| t.description == expected_description)
            .or_else(|| created.first())
            .map(|t| t.id.clone())
            .ok_or_else(|| ApiError::TriggerNotFound {
                instance: instance_id.to_string(),
                description: expected_description.to_string(),
            })
    }
}

fn with_session(params: Value, session: &str) -> Value {
    let mut body = match params {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    body.insert("SESSIONID".to_string(), Value::String(session.to_string()));
    Value::Object(body)
}

/// Strip the `{"result": ...}` wrapper and turn error payloads into errors.
fn unwrap_response(endpoint: &str, value: Value) -> ApiResult<Value> {
    let value = match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("result") => {
            map.remove("result").unwrap_or(Value::Null)
        }
        other => other,
    };
    if let Value::Object(map) = &value {
        if let (Some(title), Some(message)) = (map.get("Title"), map.get("Message")) {
            let title = title.as_str().unwrap_or_default();
            let message = message.as_str().unwrap_or_default();
            if title.to_ascii_lowercase().contains("unauthori") {
                return Err(ApiError::Authentication { target: endpoint.to_string(), reason: message.to_string() });
            }
            return Err(ApiError::rejected(endpoint, format!("{title}: {message}")));
        }
        if let Some(Value::Bool(false)) = map.get("Status") {
            let reason = map.get("Reason").and_then(Value::as_str).unwrap_or("no reason given");
            return Err(ApiError::rejected(endpoint, reason));
        }
    }
    Ok(value)
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::invalid_payload(endpoint, e.to_string()))
}

#[async_trait]
impl ControlPlane for AmpClient {
    async fn list_instances(&self) -> ApiResult<Vec<Instance>> {
        let endpoint = "ADSModule/GetInstances";
        let targets: Vec<InstanceTarget> = decode(endpoint, self.call(endpoint, json!({})).await?)?;
        Ok(targets.into_iter().flat_map(|t| t.available_instances).collect())
    }

    async fn get_settings(&self, instance_id: &str) -> ApiResult<SettingsSpec> {
        let endpoint = "Core/GetSettingsSpec";
        decode(endpoint, self.call_instance(instance_id, endpoint, json!({})).await?)
    }

    async fn app_state(&self, instance_id: &str) -> ApiResult<AppState> {
        let endpoint = "Core/GetStatus";
        let status: StatusPayload = decode(endpoint, self.call_instance(instance_id, endpoint, json!({})).await?)?;
        Ok(AppState::from_code(status.state))
    }

    async fn get_schedule(&self, instance_id: &str) -> ApiResult<ScheduleData> {
        let endpoint = "Core/GetScheduleData";
        decode(endpoint, self.call_instance(instance_id, endpoint, json!({})).await?)
    }

    async fn get_interval_trigger(&self, instance_id: &str, trigger_id: &str) -> ApiResult<IntervalSchedule> {
        let endpoint = "Core/GetTimeIntervalTrigger";
        decode(endpoint, self.call_instance(instance_id, endpoint, json!({"Id": trigger_id})).await?)
    }

    async fn get_backups(&self, instance_id: &str) -> ApiResult<Vec<BackupRecord>> {
        let endpoint = "LocalFileBackupPlugin/GetBackups";
        let mut backups: Vec<BackupRecord> =
            decode(endpoint, self.call_instance(instance_id, endpoint, json!({})).await?)?;
        for backup in &mut backups {
            backup.instance_id = instance_id.to_string();
        }
        Ok(backups)
    }

    async fn set_setting(&self, instance_id: &str, node: &str, value: &str) -> ApiResult<()> {
        self.call_instance(instance_id, "Core/SetConfig", json!({"node": node, "value": value})).await?;
        Ok(())
    }

    async fn stop_app(&self, instance_id: &str) -> ApiResult<()> {
        self.call_instance(instance_id, "Core/Stop", json!({})).await?;
        Ok(())
    }

    async fn start_app(&self, instance_id: &str) -> ApiResult<()> {
        self.call_instance(instance_id, "Core/Start", json!({})).await?;
        Ok(())
    }

    async fn delete_trigger(&self, instance_id: &str, trigger_id: &str) -> ApiResult<()> {
        self.call_instance(instance_id, "Core/DeleteTrigger", json!({"Id": trigger_id})).await?;
        Ok(())
    }

    async fn add_interval_trigger(&self, instance_id: &str, schedule: &IntervalSchedule) -> ApiResult<String> {
        let endpoint = "Core/AddIntervalTrigger";
        let params = serde_json::to_value(AddIntervalTriggerRequest::from(schedule))
            .map_err(|e| ApiError::invalid_payload(endpoint, e.to_string()))?;
        let (_, before) = self.schedule_trigger_ids(instance_id).await?;
        self.create_trigger(instance_id, endpoint, params, &before, &schedule.description).await
    }

    async fn add_event_trigger(&self, instance_id: &str, event_id: &str) -> ApiResult<String> {
        let (schedule, before) = self.schedule_trigger_ids(instance_id).await?;
        let description = schedule
            .available_triggers
            .iter()
            .find(|t| t.id == event_id)
            .map(|t| t.description.clone())
            .unwrap_or_default();
        self.create_trigger(instance_id, "Core/AddEventTrigger", json!({"triggerId": event_id}), &before, &description)
            .await
    }

    async fn add_task(&self, instance_id: &str, trigger_id: &str, task: &TaskSpec) -> ApiResult<()> {
        let params = json!({
            "TriggerID": trigger_id,
            "MethodID": task.method,
            "ParameterMapping": task.parameters,
        });
        self.call_instance(instance_id, "Core/AddTask", params).await?;
        Ok(())
    }

    async fn delete_task(&self, instance_id: &str, trigger_id: &str, task_id: &str) -> ApiResult<()> {
        self.call_instance(instance_id, "Core/DeleteTask", json!({"TriggerID": trigger_id, "TaskID": task_id}))
            .await?;
        Ok(())
    }

    async fn set_trigger_enabled(&self, instance_id: &str, trigger_id: &str, enabled: bool) -> ApiResult<()> {
        self.call_instance(instance_id, "Core/SetTriggerEnabled", json!({"Id": trigger_id, "Enabled": enabled}))
            .await?;
        Ok(())
    }

    async fn delete_backup(&self, instance_id: &str, backup_id: &str) -> ApiResult<()> {
        self.call_instance(instance_id, "LocalFileBackupPlugin/DeleteLocalBackup", json!({"BackupId": backup_id}))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_result_wrapper() {
        let value = unwrap_response("Core/GetStatus", json!({"result": {"State": 20}})).unwrap();
        assert_eq!(value, json!({"State": 20}));
        // Objects with other keys besides "result" are left alone.
        let value = unwrap_response("X", json!({"result": 1, "other": 2})).unwrap();
        assert_eq!(value, json!({"result": 1, "other": 2}));
    }

    #[test]
    fn test_error_payloads() {
        let err = unwrap_response("Core/SetConfig", json!({"result": {"Status": false, "Reason": "read-only"}}))
            .unwrap_err();
        assert_eq!(err, ApiError::rejected("Core/SetConfig", "read-only"));

        let err = unwrap_response("Core/Start", json!({"Title": "Unauthorized Access", "Message": "session expired"}))
            .unwrap_err();
        assert!(matches!(err, ApiError::Authentication { .. }));

        let err = unwrap_response("Core/Start", json!({"Title": "Boom", "Message": "stack"})).unwrap_err();
        assert!(matches!(err, ApiError::Rejected { ref reason, .. } if reason == "Boom: stack"));

        assert!(unwrap_response("Core/Stop", json!({"Status": true})).is_ok());
    }

    #[test]
    fn test_session_is_merged_into_params() {
        assert_eq!(with_session(json!({"Id": "7"}), "abc"), json!({"Id": "7", "SESSIONID": "abc"}));
        assert_eq!(with_session(Value::Null, "abc"), json!({"SESSIONID": "abc"}));
    }

    #[test]
    fn test_rejects_non_http_urls() {
        let config = ClientConfig { base_url: "ftp://amp".to_string(), ..Default::default() };
        assert!(matches!(AmpClient::new(config), Err(ClientError::InvalidUrl { .. })));
        let config = ClientConfig { base_url: "http://amp.example:8080/".to_string(), ..Default::default() };
        assert_eq!(AmpClient::new(config).unwrap().config().base_url, "http://amp.example:8080");
    }
}
