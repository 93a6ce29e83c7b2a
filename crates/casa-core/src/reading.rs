//! Telemetry readings and typed field values

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use ulid::Ulid;

/// Value type declared by the catalog for a trigger field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    #[serde(alias = "float", alias = "number")]
    Int,
    Bool,
    /// Any type name this hub does not know how to compare
    #[serde(other)]
    Unsupported,
}

/// A decoded telemetry value
///
/// Readings carry a number, a string and a boolean column side by side; the
/// catalog's declared [`ValueType`] picks which one is meaningful.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One telemetry sample for a device field
///
/// `device_id` holds the gateway's physical id on the wire and the resolved
/// registered device id once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    #[serde(default = "new_reading_id", alias = "ID", deserialize_with = "id_or_new")]
    pub id: String,

    #[serde(alias = "DeviceID")]
    pub device_id: String,

    #[serde(alias = "Field")]
    pub field: String,

    #[serde(default, alias = "ValueNbr", deserialize_with = "null_as_default")]
    pub value_nbr: f64,

    #[serde(default, alias = "ValueStr", deserialize_with = "null_as_default")]
    pub value_str: String,

    #[serde(default, alias = "ValueBool", deserialize_with = "null_as_default")]
    pub value_bool: bool,

    #[serde(default = "Utc::now", alias = "CreatedAt", deserialize_with = "timestamp_or_now")]
    pub created_at: DateTime<Utc>,
}

fn new_reading_id() -> String {
    Ulid::new().to_string()
}

// Gateways send null or "" for fields they leave unset

fn id_or_new<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|id| !id.is_empty())
        .unwrap_or_else(new_reading_id))
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unreadable timestamps fall back to the ingestion time
fn timestamp_or_now<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_else(Utc::now))
}

impl Reading {
    /// Create a reading stamped with a fresh id and the current time
    pub fn new(device_id: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            id: new_reading_id(),
            device_id: device_id.into(),
            field: field.into(),
            value_nbr: 0.0,
            value_str: String::new(),
            value_bool: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_number(mut self, value: f64) -> Self {
        self.value_nbr = value;
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.value_str = value.into();
        self
    }

    pub fn with_bool(mut self, value: bool) -> Self {
        self.value_bool = value;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Decode the column matching the declared type
    pub fn value(&self, value_type: ValueType) -> Option<FieldValue> {
        match value_type {
            ValueType::String => Some(FieldValue::String(self.value_str.clone())),
            ValueType::Int => Some(FieldValue::Number(self.value_nbr)),
            ValueType::Bool => Some(FieldValue::Bool(self.value_bool)),
            ValueType::Unsupported => None,
        }
    }
}
