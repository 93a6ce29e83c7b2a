//! The persistence seam used by the engine

use casa_core::{AutomationRecord, Capability, Device, LogEntry, LogType, Reading, ResourceType};

use crate::error::StoreResult;

/// Records the automation engine and gateway link read and write
///
/// Calls are synchronous and short; async callers invoke them directly.
pub trait Store: Send + Sync {
    fn device(&self, id: &str) -> StoreResult<Option<Device>>;

    /// Resolve a gateway-local physical id to a registered device
    fn device_by_physical_id(&self, physical_id: &str) -> StoreResult<Option<Device>>;

    /// Every device placed in a room of `home_id`
    fn devices_for_home(&self, home_id: &str) -> StoreResult<Vec<Device>>;

    /// Home a gateway belongs to
    fn gateway_home(&self, gateway_id: &str) -> StoreResult<Option<String>>;

    fn automations(&self) -> StoreResult<Vec<AutomationRecord>>;

    fn automation(&self, id: &str) -> StoreResult<Option<AutomationRecord>>;

    /// Automations of one home, oldest first
    fn automations_for_home(&self, home_id: &str) -> StoreResult<Vec<AutomationRecord>>;

    fn insert_automation(&self, record: &AutomationRecord) -> StoreResult<()>;

    /// Overwrite name, status and rule arrays of an automation in its home
    ///
    /// Returns `false` when no such automation exists.
    fn update_automation(&self, record: &AutomationRecord) -> StoreResult<bool>;

    /// Returns `false` when no such automation exists in the home
    fn delete_automation(&self, home_id: &str, id: &str) -> StoreResult<bool>;

    fn insert_reading(&self, reading: &Reading) -> StoreResult<()>;

    /// Most recent reading for a device field, newest `created_at` first,
    /// later inserts winning ties
    fn latest_reading(&self, device_id: &str, field: &str) -> StoreResult<Option<Reading>>;

    fn append_log(&self, entry: &LogEntry) -> StoreResult<()>;

    /// Audit rows for a reference, oldest first
    fn logs_for(&self, log_type: LogType, reference_id: &str) -> StoreResult<Vec<LogEntry>>;

    /// Whether `user_id` holds `capability` on a resource
    ///
    /// The `admin` flag implies every capability.
    fn has_permission(
        &self,
        user_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
        capability: Capability,
    ) -> StoreResult<bool>;

    /// User owning a session token
    fn user_for_token(&self, token: &str) -> StoreResult<Option<String>>;
}
