//! Wire messages exchanged with the gateway
//!
//! Every frame is a JSON envelope `{"action": "...", "body": "<base64>"}`.
//! The body is an opaque byte string: a raw address for `newConnection`,
//! JSON for everything else.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use casa_core::{DiscoveredDevice, Reading};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

use crate::error::{GatewayError, GatewayResult};

/// Inbound: gateway announces its HTTP address
pub const NEW_CONNECTION: &str = "newConnection";
/// Inbound: one or more telemetry readings
pub const NEW_DATA: &str = "newData";
/// Inbound: answer to `discoverDevices`
pub const DISCOVERED_DEVICES: &str = "discoveredDevices";
/// Outbound: run a command on a device
pub const CALL_ACTION: &str = "callAction";
/// Outbound: enumerate devices for the plugin named in the prep call
pub const DISCOVER_DEVICES: &str = "discoverDevices";

/// A single link frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(alias = "Action")]
    pub action: String,

    #[serde(default, alias = "Body", with = "base64_body")]
    pub body: Vec<u8>,
}

impl Envelope {
    pub fn new(action: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            action: action.into(),
            body: body.into(),
        }
    }

    /// Envelope with no body
    pub fn empty(action: impl Into<String>) -> Self {
        Self::new(action, Vec::new())
    }

    /// Envelope whose body is the JSON encoding of `body`
    pub fn json<T: Serialize>(action: impl Into<String>, body: &T) -> GatewayResult<Self> {
        Ok(Self::new(action, serde_json::to_vec(body)?))
    }

    /// Parse a text frame
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Render as a text frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode the body as JSON
    pub fn body_json<T: DeserializeOwned>(&self) -> GatewayResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| GatewayError::Decode {
            action: self.action.clone(),
            reason: e.to_string(),
        })
    }
}

mod base64_body {
    use super::*;

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => STANDARD.decode(s).map_err(serde::de::Error::custom),
            _ => Ok(Vec::new()),
        }
    }
}

/// `callAction` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    #[serde(alias = "PhysicalID")]
    pub physical_id: String,
    #[serde(alias = "Plugin")]
    pub plugin: String,
    #[serde(alias = "Call")]
    pub call: String,
    #[serde(default, alias = "Config")]
    pub config: String,
    #[serde(default, alias = "Params")]
    pub params: String,
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    NewConnection { address: String },
    NewData(Vec<Reading>),
    DiscoveredDevices(Vec<DiscoveredDevice>),
    /// Anything else; ignored by the hub
    Unknown(String),
}

impl Inbound {
    pub fn parse(envelope: &Envelope) -> GatewayResult<Self> {
        match envelope.action.as_str() {
            NEW_CONNECTION => Ok(Inbound::NewConnection {
                address: parse_address(envelope)?,
            }),
            NEW_DATA => Ok(Inbound::NewData(parse_readings(envelope)?)),
            DISCOVERED_DEVICES => {
                if envelope.body.is_empty() {
                    return Ok(Inbound::DiscoveredDevices(Vec::new()));
                }
                let devices: Option<Vec<DiscoveredDevice>> = envelope.body_json()?;
                Ok(Inbound::DiscoveredDevices(devices.unwrap_or_default()))
            }
            other => Ok(Inbound::Unknown(other.to_string())),
        }
    }
}

/// A single reading or an array of them
///
/// Entries are decoded one at a time; a malformed entry is dropped alone.
fn parse_readings(envelope: &Envelope) -> GatewayResult<Vec<Reading>> {
    let items = match envelope.body_json::<Value>()? {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        item => vec![item],
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Reading>(item) {
            Ok(reading) => Some(reading),
            Err(e) => {
                warn!("Dropping malformed reading: {}", e);
                None
            }
        })
        .collect())
}

/// The address arrives as raw bytes, though a JSON string is accepted too
fn parse_address(envelope: &Envelope) -> GatewayResult<String> {
    if let Ok(address) = serde_json::from_slice::<String>(&envelope.body) {
        return Ok(address.trim().to_string());
    }
    let address = std::str::from_utf8(&envelope.body).map_err(|e| GatewayError::Decode {
        action: envelope.action.clone(),
        reason: e.to_string(),
    })?;
    Ok(address.trim().to_string())
}
