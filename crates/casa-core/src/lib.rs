//! Core types for the Casa home-automation hub
//!
//! This crate provides the records shared by every other crate: registered
//! devices, stored automations, telemetry readings, audit log entries,
//! permission capabilities and the gateway-supplied plugin catalog.

mod automation;
mod catalog;
mod device;
mod log;
mod permission;
mod reading;

pub use automation::AutomationRecord;
pub use catalog::{Catalog, CommandSpec, DeviceModel, FieldSpec, PluginConfig};
pub use device::{DiscoveredDevice, Device};
pub use log::{LogEntry, LogType};
pub use permission::{Capability, ResourceType};
pub use reading::{FieldValue, Reading, ValueType};

/// Combinator keywords as stored in automation records
pub mod operators {
    /// Both neighbouring trigger outcomes must hold
    pub const AND: &str = "AND";

    /// Starts a new group of AND-chained outcomes
    pub const OR: &str = "OR";
}
