//! Configuration loading: JSON file plus environment overrides.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use fleetsync_types::ConfigError;

use crate::sync::schedule::SchedulePolicy;
use crate::sync::settings::SettingsPolicy;

const CONFIG_FILE: &str = "fleetsync.json";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_URL: &str = "AMP_URL";
pub const ENV_USER: &str = "AMP_USER";
pub const ENV_PASS: &str = "AMP_PASS";

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: Option<u64>,
    pub settings: SettingsPolicy,
    pub schedule: SchedulePolicy,
}

/// Controller endpoint and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &mask_secret(&self.password))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
    pub settings: SettingsPolicy,
    pub schedule: SchedulePolicy,
    /// File the configuration was read from, if any
    pub source: Option<PathBuf>,
}

/// Candidate locations searched when no explicit path is given.
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("fleetsync").join("config.json"));
    }
    paths
}

/// Read and parse one configuration file.
pub fn read_config_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(path, &e))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))
}

/// Load configuration from the file system and the process environment.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(explicit, &default_config_paths(), |name| std::env::var(name).ok())
}

/// Load configuration with an injectable environment lookup.
///
/// An explicit path must exist; otherwise the first existing candidate is
/// used, and no file at all is fine as long as the environment supplies the
/// connection values. Environment values win over file values.
pub fn load_config_with<F>(
    explicit: Option<&Path>,
    candidates: &[PathBuf],
    env: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let source = match explicit {
        Some(path) if !path.exists() => {
            return Err(ConfigError::NotFound { path: path.display().to_string() });
        }
        Some(path) => Some(path.to_path_buf()),
        None => candidates.iter().find(|p| p.exists()).cloned(),
    };

    let file = match &source {
        Some(path) => {
            tracing::debug!("Loading configuration from {}", path.display());
            read_config_file(path)?
        }
        None => FileConfig::default(),
    };

    let connection = ConnectionConfig {
        url: require_value("url", ENV_URL, file.url.as_deref(), &env)?
            .trim_end_matches('/')
            .to_string(),
        username: require_value("username", ENV_USER, file.username.as_deref(), &env)?,
        password: require_value("password", ENV_PASS, file.password.as_deref(), &env)?,
        timeout_secs: file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    validate(&connection, &file.settings)?;

    Ok(AppConfig { connection, settings: file.settings, schedule: file.schedule, source })
}

fn require_value<F>(
    field: &str,
    env_name: &str,
    file_value: Option<&str>,
    env: &F,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    env(env_name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| file_value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string))
        .ok_or_else(|| ConfigError::Missing { field: field.to_string(), env: env_name.to_string() })
}

fn validate(connection: &ConnectionConfig, settings: &SettingsPolicy) -> Result<(), ConfigError> {
    if !(connection.url.starts_with("http://") || connection.url.starts_with("https://")) {
        return Err(ConfigError::ValidationError {
            field: "url".to_string(),
            message: format!("expected an http(s) URL, got '{}'", connection.url),
        });
    }
    if connection.timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "timeout_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if settings.stop_poll_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "settings.stop_poll_secs".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}...{tail}")
}
