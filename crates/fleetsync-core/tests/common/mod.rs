//! Recording in-memory control plane for integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]
#![allow(clippy::panic, reason = "a forbidden call must fail the test")]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

use fleetsync_core::{ApiResult, ControlPlane};
use fleetsync_types::models::{
    AppState, AvailableTrigger, BackupRecord, Instance, IntervalSchedule, MethodInput, MethodSpec,
    ScheduleData, SettingNode, SettingsSpec, TaskRecord, TaskSpec, TriggerRecord,
};
use fleetsync_types::ApiError;

pub const SETTINGS_GROUP: &str = "arksa:stadiacontroller";
pub const ARK_IMAGE: &str = "steam:2399830";
pub const STARTED_EVENT: &str = "The application has started";

#[derive(Debug, Default)]
pub struct MockState {
    pub instances: Vec<Instance>,
    pub settings: HashMap<String, SettingsSpec>,
    pub app_states: HashMap<String, AppState>,
    pub schedules: HashMap<String, ScheduleData>,
    pub intervals: HashMap<(String, String), IntervalSchedule>,
    pub backups: HashMap<String, Vec<BackupRecord>>,
    /// Mutating calls in order, e.g. `stop_app:ark02`
    pub calls: Vec<String>,
    /// Setting nodes whose writes are rejected
    pub failing_nodes: HashSet<String>,
    /// Instances whose app ignores stop requests
    pub stuck_running: HashSet<String>,
    /// `(instance id, description prefix)` of trigger creations to reject
    pub failing_triggers: HashSet<(String, String)>,
    /// New event triggers come with a default task, like the real controller
    pub event_default_tasks: bool,
    pub next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn trigger_rejected(&self, instance_id: &str, description: &str) -> bool {
        self.failing_triggers
            .iter()
            .any(|(id, prefix)| id == instance_id && description.starts_with(prefix.as_str()))
    }

    fn schedule_mut(&mut self, instance_id: &str) -> &mut ScheduleData {
        self.schedules.entry(instance_id.to_string()).or_default()
    }

    fn trigger_mut(&mut self, instance_id: &str, trigger_id: &str) -> ApiResult<&mut TriggerRecord> {
        self.schedule_mut(instance_id)
            .populated_triggers
            .iter_mut()
            .find(|t| t.id == trigger_id)
            .ok_or_else(|| ApiError::rejected("Core/Trigger", format!("no trigger {trigger_id}")))
    }
}

pub struct MockControlPlane {
    pub state: Mutex<MockState>,
    /// Panic on any mutating call
    read_only: bool,
}

impl MockControlPlane {
    pub fn new(state: MockState) -> Self {
        Self { state: Mutex::new(state), read_only: false }
    }

    /// A control plane that fails the test on any mutating call.
    pub fn read_only(state: MockState) -> Self {
        Self { state: Mutex::new(state), read_only: true }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    pub async fn schedule(&self, instance_id: &str) -> ScheduleData {
        self.state.lock().await.schedules.get(instance_id).cloned().unwrap_or_default()
    }

    async fn record(&self, call: String) -> tokio::sync::MutexGuard<'_, MockState> {
        if self.read_only {
            panic!("mutating call in dry-run: {call}");
        }
        let mut state = self.state.lock().await;
        state.calls.push(call);
        state
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn list_instances(&self) -> ApiResult<Vec<Instance>> {
        Ok(self.state.lock().await.instances.clone())
    }

    async fn get_settings(&self, instance_id: &str) -> ApiResult<SettingsSpec> {
        self.state
            .lock()
            .await
            .settings
            .get(instance_id)
            .cloned()
            .ok_or_else(|| ApiError::rejected("Core/GetSettingsSpec", format!("unknown {instance_id}")))
    }

    async fn app_state(&self, instance_id: &str) -> ApiResult<AppState> {
        Ok(self.state.lock().await.app_states.get(instance_id).copied().unwrap_or(AppState::Ready))
    }

    async fn get_schedule(&self, instance_id: &str) -> ApiResult<ScheduleData> {
        Ok(self.schedule(instance_id).await)
    }

    async fn get_interval_trigger(&self, instance_id: &str, trigger_id: &str) -> ApiResult<IntervalSchedule> {
        self.state
            .lock()
            .await
            .intervals
            .get(&(instance_id.to_string(), trigger_id.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::rejected("Core/GetTimeIntervalTrigger", "not an interval trigger"))
    }

    async fn get_backups(&self, instance_id: &str) -> ApiResult<Vec<BackupRecord>> {
        Ok(self.state.lock().await.backups.get(instance_id).cloned().unwrap_or_default())
    }

    async fn set_setting(&self, instance_id: &str, node: &str, value: &str) -> ApiResult<()> {
        let mut state = self.record(format!("set_setting:{instance_id}:{node}={value}")).await;
        if state.failing_nodes.contains(node) {
            return Err(ApiError::rejected("Core/SetConfig", format!("{node} is locked")));
        }
        let spec = state.settings.entry(instance_id.to_string()).or_default();
        for entry in spec.values_mut().flatten().filter(|n| n.node == node) {
            entry.current_value = Value::String(value.to_string());
        }
        Ok(())
    }

    async fn stop_app(&self, instance_id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("stop_app:{instance_id}")).await;
        if !state.stuck_running.contains(instance_id) {
            state.app_states.insert(instance_id.to_string(), AppState::Stopped);
        }
        Ok(())
    }

    async fn start_app(&self, instance_id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("start_app:{instance_id}")).await;
        state.app_states.insert(instance_id.to_string(), AppState::Ready);
        Ok(())
    }

    async fn delete_trigger(&self, instance_id: &str, trigger_id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("delete_trigger:{instance_id}:{trigger_id}")).await;
        state.schedule_mut(instance_id).populated_triggers.retain(|t| t.id != trigger_id);
        state.intervals.remove(&(instance_id.to_string(), trigger_id.to_string()));
        Ok(())
    }

    async fn add_interval_trigger(&self, instance_id: &str, schedule: &IntervalSchedule) -> ApiResult<String> {
        let mut state = self.record(format!("add_interval_trigger:{instance_id}")).await;
        if state.trigger_rejected(instance_id, &schedule.description) {
            return Err(ApiError::rejected("Core/AddIntervalTrigger", "trigger limit reached"));
        }
        let id = state.next_id("trg");
        state.schedule_mut(instance_id).populated_triggers.push(TriggerRecord {
            id: id.clone(),
            trigger_type: "IntervalTrigger".to_string(),
            description: schedule.description.clone(),
            enabled_state: false,
            tasks: Vec::new(),
        });
        state.intervals.insert((instance_id.to_string(), id.clone()), schedule.clone());
        Ok(id)
    }

    async fn add_event_trigger(&self, instance_id: &str, event_id: &str) -> ApiResult<String> {
        let mut state = self.record(format!("add_event_trigger:{instance_id}:{event_id}")).await;
        let description = state
            .schedule_mut(instance_id)
            .available_triggers
            .iter()
            .find(|t| t.id == event_id)
            .map(|t| t.description.clone())
            .ok_or_else(|| ApiError::rejected("Core/AddEventTrigger", "unknown event"))?;
        if state.trigger_rejected(instance_id, &description) {
            return Err(ApiError::rejected("Core/AddEventTrigger", "trigger limit reached"));
        }
        let id = state.next_id("trg");
        let tasks = if state.event_default_tasks {
            vec![TaskRecord {
                id: state.next_id("task"),
                task_method_name: "Core.SendConsoleMessage".to_string(),
                parameter_mapping: BTreeMap::new(),
                order: 0,
            }]
        } else {
            Vec::new()
        };
        state.schedule_mut(instance_id).populated_triggers.push(TriggerRecord {
            id: id.clone(),
            trigger_type: "EventTrigger".to_string(),
            description,
            enabled_state: true,
            tasks,
        });
        Ok(id)
    }

    async fn add_task(&self, instance_id: &str, trigger_id: &str, task: &TaskSpec) -> ApiResult<()> {
        let mut state = self.record(format!("add_task:{instance_id}:{trigger_id}:{}", task.method)).await;
        let task_id = state.next_id("task");
        let trigger = state.trigger_mut(instance_id, trigger_id)?;
        let order = trigger.tasks.len() as i64;
        trigger.tasks.push(TaskRecord {
            id: task_id,
            task_method_name: task.method.clone(),
            parameter_mapping: task
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            order,
        });
        Ok(())
    }

    async fn delete_task(&self, instance_id: &str, trigger_id: &str, task_id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("delete_task:{instance_id}:{trigger_id}:{task_id}")).await;
        state.trigger_mut(instance_id, trigger_id)?.tasks.retain(|t| t.id != task_id);
        Ok(())
    }

    async fn set_trigger_enabled(&self, instance_id: &str, trigger_id: &str, enabled: bool) -> ApiResult<()> {
        let mut state = self.record(format!("set_trigger_enabled:{instance_id}:{trigger_id}={enabled}")).await;
        state.trigger_mut(instance_id, trigger_id)?.enabled_state = enabled;
        Ok(())
    }

    async fn delete_backup(&self, instance_id: &str, backup_id: &str) -> ApiResult<()> {
        let mut state = self.record(format!("delete_backup:{instance_id}:{backup_id}")).await;
        if let Some(backups) = state.backups.get_mut(instance_id) {
            backups.retain(|b| b.id != backup_id);
        }
        Ok(())
    }
}

// ---- fixtures ----

pub fn instance(id: &str, friendly_name: &str) -> Instance {
    Instance {
        id: id.to_string(),
        instance_name: id.to_uppercase(),
        friendly_name: friendly_name.to_string(),
        module: "GenericModule".to_string(),
        display_image_source: ARK_IMAGE.to_string(),
        running: true,
    }
}

/// Template `ark01`, destinations `ark02`/`ark03`, a controller and an outsider.
pub fn ark_fleet() -> Vec<Instance> {
    let mut controller = instance("ads01", "Controller");
    controller.module = "ADS".to_string();
    vec![
        controller,
        instance("ark01", "The Island -TEMPLATE ARK-"),
        instance("ark03", "Ragnarok -ARK-"),
        instance("ark02", "Aberration -ark-"),
        instance("pal01", "Palworld -PAL-"),
    ]
}

pub fn settings_spec(values: &[(&str, Value)]) -> SettingsSpec {
    let nodes = values
        .iter()
        .map(|(node, value)| SettingNode {
            node: (*node).to_string(),
            name: (*node).to_string(),
            current_value: value.clone(),
            ..Default::default()
        })
        .collect();
    SettingsSpec::from([(SETTINGS_GROUP.to_string(), nodes)])
}

pub fn ark_settings(max_players: i64, session: &str, random_admin_password: bool) -> SettingsSpec {
    settings_spec(&[
        ("GenericModule.App.MaxPlayers", json!(max_players)),
        ("GenericModule.App.UseRandomAdminPassword", json!(random_admin_password)),
        ("Meta.GenericModule.SessionName", json!(session)),
    ])
}

/// Schedule surface every ARK instance offers, without populated triggers.
pub fn ark_schedule_surface() -> ScheduleData {
    ScheduleData {
        available_triggers: vec![
            AvailableTrigger {
                id: "ev-started".to_string(),
                description: STARTED_EVENT.to_string(),
                trigger_type: "EventTrigger".to_string(),
            },
            AvailableTrigger {
                id: "ev-joined".to_string(),
                description: "A player joins the server".to_string(),
                trigger_type: "EventTrigger".to_string(),
            },
        ],
        available_methods: vec![
            MethodSpec {
                id: "LocalFileBackupPlugin.TakeBackup".to_string(),
                name: "Take a backup".to_string(),
                consumes: vec![
                    MethodInput { name: "Title".to_string() },
                    MethodInput { name: "Sticky".to_string() },
                ],
            },
            MethodSpec {
                id: "Core.SendConsoleMessage".to_string(),
                name: "Send a console message".to_string(),
                consumes: vec![MethodInput { name: "Message".to_string() }],
            },
        ],
        populated_triggers: Vec::new(),
    }
}

/// Template schedule: an hourly backup at minute 30 and a start-up message.
pub fn template_schedule(state: &mut MockState) {
    let mut schedule = ark_schedule_surface();
    schedule.populated_triggers = vec![
        TriggerRecord {
            id: "t-backup".to_string(),
            trigger_type: "IntervalTrigger".to_string(),
            description: "Hourly backup".to_string(),
            enabled_state: true,
            tasks: vec![TaskRecord {
                id: "k1".to_string(),
                task_method_name: "LocalFileBackupPlugin.TakeBackup".to_string(),
                parameter_mapping: BTreeMap::from([
                    ("title".to_string(), json!("Hourly")),
                    ("sticky".to_string(), json!(true)),
                ]),
                order: 0,
            }],
        },
        TriggerRecord {
            id: "t-started".to_string(),
            trigger_type: "EventTrigger".to_string(),
            description: STARTED_EVENT.to_string(),
            enabled_state: false,
            tasks: vec![TaskRecord {
                id: "k2".to_string(),
                task_method_name: "Core.SendConsoleMessage".to_string(),
                parameter_mapping: BTreeMap::from([("message".to_string(), json!("Welcome"))]),
                order: 0,
            }],
        },
    ];
    state.schedules.insert("ark01".to_string(), schedule);
    state.intervals.insert(
        ("ark01".to_string(), "t-backup".to_string()),
        IntervalSchedule {
            match_minutes: vec![30],
            description: "Hourly backup".to_string(),
            ..Default::default()
        },
    );
}

/// Fleet with settings and schedules populated for every ARK instance.
pub fn ark_state() -> MockState {
    let mut state = MockState { instances: ark_fleet(), event_default_tasks: true, ..Default::default() };
    state.settings.insert("ark01".to_string(), ark_settings(70, "Template Island", true));
    state.settings.insert("ark02".to_string(), ark_settings(50, "Aberration", true));
    state.settings.insert("ark03".to_string(), ark_settings(70, "Ragnarok", false));
    template_schedule(&mut state);
    for dest in ["ark02", "ark03"] {
        state.schedules.insert(dest.to_string(), ark_schedule_surface());
    }
    state
}
