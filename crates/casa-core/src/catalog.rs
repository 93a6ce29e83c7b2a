//! Plugin/Field catalog
//!
//! The gateway publishes, per plugin, which device models exist, which
//! telemetry fields each model reports and which commands it accepts. The hub
//! merges every catalog it receives: plugins already known keep their first
//! definition.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reading::ValueType;

/// A telemetry field reported by a device model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(rename = "type", alias = "Type")]
    pub value_type: ValueType,

    /// Only available through live pushes, never queried from history
    #[serde(default, alias = "Direct")]
    pub direct: bool,
}

/// A device model and the trigger fields it exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceModel {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(default, alias = "Fields")]
    pub fields: Vec<FieldSpec>,
}

/// A command a plugin accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(default, alias = "Description")]
    pub description: String,

    #[serde(default, alias = "Fields")]
    pub fields: Vec<FieldSpec>,
}

/// Catalog entry for one plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfig {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(default, alias = "Version")]
    pub version: String,

    #[serde(default, alias = "Description")]
    pub description: String,

    /// Whether the plugin can enumerate unregistered devices
    #[serde(default, alias = "Discover")]
    pub discover: bool,

    /// Device models, keyed by the device's `physical_name`
    #[serde(default, alias = "Triggers")]
    pub triggers: Vec<DeviceModel>,

    #[serde(default, alias = "Actions")]
    pub actions: Vec<CommandSpec>,
}

impl PluginConfig {
    /// Find a device model by name
    pub fn model(&self, name: &str) -> Option<&DeviceModel> {
        self.triggers.iter().find(|m| m.name == name)
    }
}

impl DeviceModel {
    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Merge-only catalog shared between the gateway link and the evaluator
#[derive(Debug, Default)]
pub struct Catalog {
    plugins: DashMap<String, PluginConfig>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge plugin configurations, keeping existing entries untouched
    ///
    /// Returns the number of plugins that were added.
    pub fn merge(&self, configs: impl IntoIterator<Item = PluginConfig>) -> usize {
        let mut added = 0;
        for config in configs {
            let name = config.name.clone();
            let mut inserted = false;
            self.plugins.entry(name.clone()).or_insert_with(|| {
                inserted = true;
                config
            });
            if inserted {
                added += 1;
                debug!(plugin = %name, "Added plugin to catalog");
            }
        }
        added
    }

    /// Get a plugin configuration by name
    pub fn plugin(&self, name: &str) -> Option<PluginConfig> {
        self.plugins.get(name).map(|p| p.clone())
    }

    /// Resolve the descriptor for `field` on device model `model` of `plugin`
    pub fn field(&self, plugin: &str, model: &str, field: &str) -> Option<FieldSpec> {
        let config = self.plugins.get(plugin)?;
        config.model(model)?.field(field).cloned()
    }

    /// All plugins sorted by name
    pub fn plugins(&self) -> Vec<PluginConfig> {
        let mut plugins: Vec<PluginConfig> = self.plugins.iter().map(|p| p.clone()).collect();
        plugins.sort_by(|a, b| a.name.cmp(&b.name));
        plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
