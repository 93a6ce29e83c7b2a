//! Audit log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// What an audit log row refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    /// An automation fired; the reference is the automation id
    Automation,
    /// A command was sent to a device by hand; the reference is the device id
    Device,
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Automation => "automation",
            LogType::Device => "device",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "automation" => Some(LogType::Automation),
            "device" => Some(LogType::Device),
            _ => None,
        }
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,

    #[serde(rename = "type")]
    pub log_type: LogType,

    /// Automation or device id, depending on `log_type`
    pub reference_id: String,

    /// Opaque payload, usually the JSON of what was sent
    pub value: String,

    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Create a new entry stamped with a fresh ULID and the current time
    pub fn new(log_type: LogType, reference_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Ulid::new().to_string(),
            log_type,
            reference_id: reference_id.into(),
            value: value.into(),
            created_at: Utc::now(),
        }
    }
}
