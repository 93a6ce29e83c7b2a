//! Stored automation rows
//!
//! The record mirrors the persisted layout: parallel arrays for triggers and
//! actions, with operators and comparison values still in their string form.
//! `casa-automation` parses a record into a typed rule before evaluation.

use serde::{Deserialize, Serialize};

/// A stored condition/action rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRecord {
    /// Unique identifier (ULID)
    pub id: String,

    /// Home the automation belongs to
    pub home_id: String,

    /// Human-readable name
    pub name: String,

    /// Whether the automation is enabled
    #[serde(default = "default_status")]
    pub status: bool,

    /// Device ids whose telemetry is tested, in evaluation order
    #[serde(default, alias = "trigger")]
    pub triggers: Vec<String>,

    /// Field name tested for each trigger device
    #[serde(default, alias = "triggerKey")]
    pub trigger_keys: Vec<String>,

    /// Expected value for each trigger; numeric stored fields carry an
    /// operator prefix such as `">=20"`
    #[serde(default, alias = "triggerValue")]
    pub trigger_values: Vec<String>,

    /// `AND`/`OR` between consecutive trigger outcomes
    #[serde(default, alias = "triggerOperator")]
    pub trigger_operators: Vec<String>,

    /// Device ids receiving commands
    #[serde(default, alias = "action")]
    pub actions: Vec<String>,

    /// Command name sent to each action device
    #[serde(default, alias = "actionCall")]
    pub action_calls: Vec<String>,

    /// Parameter string sent with each command
    #[serde(default, alias = "actionValue")]
    pub action_values: Vec<String>,

    /// User that created the automation
    #[serde(default)]
    pub creator_id: String,
}

fn default_status() -> bool {
    true
}
