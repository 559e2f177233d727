//! Managed instance models.

use serde::{Deserialize, Serialize};

/// A managed game-server instance as reported by the controller.
///
/// Snapshot only: re-fetched on every run, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    /// Controller-assigned instance id (GUID)
    #[serde(rename = "InstanceID")]
    pub id: String,
    /// Internal instance name (e.g. "ARKSurvivalAscended02")
    #[serde(default)]
    pub instance_name: String,
    /// Operator-chosen display name carrying the group markers
    #[serde(default)]
    pub friendly_name: String,
    /// Module designator (e.g. "GenericModule", "ADS")
    #[serde(default)]
    pub module: String,
    /// Application image source (e.g. "steam:2399830"); preferred app discriminator
    #[serde(default)]
    pub display_image_source: String,
    /// Whether the instance process is up (its API is reachable)
    #[serde(default)]
    pub running: bool,
}

impl Instance {
    /// Application type used for the template/destination safety gate.
    ///
    /// Prefers the image source and falls back to the module when empty.
    pub fn app_type(&self) -> &str {
        let image = self.display_image_source.trim();
        if image.is_empty() {
            self.module.trim()
        } else {
            image
        }
    }

    /// Controller (ADS) instances never take part in a sync.
    pub fn is_controller(&self) -> bool {
        self.module == "ADS" || self.instance_name.starts_with("ADS")
    }

    /// Human-readable label: `friendly name (instance name)`.
    pub fn label(&self) -> String {
        if self.friendly_name.is_empty() {
            self.instance_name.clone()
        } else {
            format!("{} ({})", self.friendly_name, self.instance_name)
        }
    }
}

/// Application state codes reported by `Core/GetStatus`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppState {
    Undefined,
    Stopped,
    PreStart,
    Configuring,
    Starting,
    Ready,
    Restarting,
    Stopping,
    PreparingForSleep,
    Sleeping,
    Waiting,
    Installing,
    PreparingForUpdate,
    Updating,
    AwaitingUserInput,
    Failed,
    Suspended,
    Maintenance,
    Indeterminate,
    Other(i32),
}

impl AppState {
    pub fn from_code(code: i32) -> Self {
        match code {
            -1 => Self::Undefined,
            0 => Self::Stopped,
            5 => Self::PreStart,
            7 => Self::Configuring,
            10 => Self::Starting,
            20 => Self::Ready,
            30 => Self::Restarting,
            40 => Self::Stopping,
            45 => Self::PreparingForSleep,
            50 => Self::Sleeping,
            60 => Self::Waiting,
            70 => Self::Installing,
            75 => Self::PreparingForUpdate,
            80 => Self::Updating,
            90 => Self::AwaitingUserInput,
            100 => Self::Failed,
            200 => Self::Suspended,
            250 => Self::Maintenance,
            999 => Self::Indeterminate,
            other => Self::Other(other),
        }
    }

    /// True while the application process may still be touching its config.
    pub fn is_running(self) -> bool {
        !matches!(
            self,
            Self::Undefined | Self::Stopped | Self::Sleeping | Self::Failed | Self::Suspended
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(module: &str, image: &str) -> Instance {
        Instance {
            id: "a1".to_string(),
            instance_name: "ARK01".to_string(),
            friendly_name: "Island -ARK-".to_string(),
            module: module.to_string(),
            display_image_source: image.to_string(),
            running: true,
        }
    }

    #[test]
    fn test_app_type_prefers_image_source() {
        assert_eq!(instance("GenericModule", "steam:2399830").app_type(), "steam:2399830");
        assert_eq!(instance("GenericModule", "  ").app_type(), "GenericModule");
    }

    #[test]
    fn test_controller_detection() {
        assert!(instance("ADS", "").is_controller());
        let mut ads = instance("GenericModule", "");
        ads.instance_name = "ADS01".to_string();
        assert!(ads.is_controller());
        assert!(!instance("GenericModule", "").is_controller());
    }

    #[test]
    fn test_app_state_codes() {
        assert!(!AppState::from_code(0).is_running());
        assert!(AppState::from_code(20).is_running());
        assert!(AppState::from_code(40).is_running());
        assert_eq!(AppState::from_code(12345), AppState::Other(12345));
    }

    #[test]
    fn test_deserialize_from_controller_payload() {
        let json = r#"{"InstanceID":"a1","InstanceName":"ARK01","FriendlyName":"Island -ARK-",
            "Module":"GenericModule","DisplayImageSource":"steam:2399830","Running":true,"AppState":20}"#;
        let parsed: Instance = serde_json::from_str(json).expect("valid instance");
        assert_eq!(parsed, instance("GenericModule", "steam:2399830"));
    }
}
