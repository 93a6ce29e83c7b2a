//! Typed hub configuration from `casa.yaml`

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{ConfigError, ConfigResult};
use crate::loader::load_yaml;

/// Name of the main configuration file inside the config directory
pub const CONFIG_FILE: &str = "casa.yaml";

const MIN_INTERVAL_MS: u64 = 50;
const MAX_INTERVAL_MS: u64 = 10_000;

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// SQLite database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file, relative paths resolve against the config directory
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Automation scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSettings {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl AutomationSettings {
    /// Scheduler tick, clamped to a sane range
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS))
    }
}

/// Gateway link settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Timeout for HTTP calls to the gateway (catalog fetch, discovery prep)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long a discovery request waits for `discoveredDevices`
    #[serde(default = "default_discovery_timeout")]
    pub discovery_timeout_secs: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            discovery_timeout_secs: default_discovery_timeout(),
        }
    }
}

impl GatewaySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Complete hub configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub automation: AutomationSettings,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_bind() -> String {
    "0.0.0.0:4353".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("casa.db")
}

fn default_interval_ms() -> u64 {
    250
}

fn default_request_timeout() -> u64 {
    10
}

fn default_discovery_timeout() -> u64 {
    30
}

fn default_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Load `casa.yaml` from a config directory, falling back to defaults
    /// when the file does not exist
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let config_dir = config_dir.as_ref();
        if !config_dir.join(CONFIG_FILE).exists() {
            info!("No {} in {:?}, using defaults", CONFIG_FILE, config_dir);
            return Ok(Self::default());
        }

        let yaml = load_yaml(config_dir, CONFIG_FILE)?;
        Self::from_yaml(&yaml)
    }

    /// Parse from an already-resolved YAML value
    pub fn from_yaml(yaml: &Value) -> ConfigResult<Self> {
        match yaml {
            // An empty file parses as null
            Value::Null => Ok(Self::default()),
            Value::Mapping(_) => {
                serde_yaml::from_value(yaml.clone()).map_err(|e| ConfigError::InvalidValue {
                    key: "root".to_string(),
                    reason: e.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidValue {
                key: "root".to_string(),
                reason: "configuration must be a mapping".to_string(),
            }),
        }
    }

    /// Absolute database path
    pub fn database_path(&self, config_dir: impl AsRef<Path>) -> PathBuf {
        if self.database.path.is_absolute() {
            self.database.path.clone()
        } else {
            config_dir.as_ref().join(&self.database.path)
        }
    }
}
