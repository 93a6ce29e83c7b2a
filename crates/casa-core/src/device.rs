//! Registered devices and gateway-reported discovery candidates

use serde::{Deserialize, Serialize};

/// A registered physical endpoint reachable through a gateway
///
/// `(physical_id, gateway_id)` is unique across all devices, which prevents
/// registering the same physical endpoint twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Internal identifier (ULID)
    pub id: String,

    /// Gateway owning the physical connection
    pub gateway_id: String,

    /// Room the device is placed in
    pub room_id: String,

    /// Human-readable name
    #[serde(default)]
    pub name: String,

    /// Gateway-local identity of the endpoint
    pub physical_id: String,

    /// Device model name, used to look up trigger fields in the catalog
    pub physical_name: String,

    /// Catalog namespace (plugin name)
    pub plugin: String,

    /// Opaque plugin-specific configuration (e.g. polling address)
    #[serde(default)]
    pub config: String,

    /// Icon name for user interfaces
    #[serde(default)]
    pub icon: String,
}

/// A device the gateway can see but that may not be registered yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDevice {
    pub physical_id: String,

    pub plugin: String,

    #[serde(default)]
    pub physical_name: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub config: String,
}
