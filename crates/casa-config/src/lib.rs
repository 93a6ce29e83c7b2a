//! YAML configuration loading for the Casa hub
//!
//! The hub reads `casa.yaml` from its config directory. Three custom tags are
//! understood:
//!
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution
//! - `!include path` - Inline another YAML file
//!
//! # Example
//!
//! ```ignore
//! use casa_config::ServerConfig;
//!
//! let config = ServerConfig::load("/etc/casa")?;
//! println!("listening on {}", config.http.bind);
//! ```

mod error;
mod loader;
mod secrets;
mod server_config;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_yaml, YamlLoader};
pub use secrets::Secrets;
pub use server_config::{
    AutomationSettings, DatabaseSettings, GatewaySettings, HttpSettings, LoggingSettings,
    ServerConfig, CONFIG_FILE,
};

pub use serde_yaml::Value;
