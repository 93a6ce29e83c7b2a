//! Action dispatch over the link

use casa_core::{Capability, Device, LogEntry, LogType, ResourceType};
use tracing::{debug, info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{ActionMessage, Envelope, CALL_ACTION};
use crate::session::GatewaySession;

/// Build the `callAction` body for a command on `device`
pub fn action_message(device: &Device, call: &str, params: &str) -> ActionMessage {
    ActionMessage {
        physical_id: device.physical_id.clone(),
        plugin: device.plugin.clone(),
        call: call.to_string(),
        config: device.config.clone(),
        params: params.to_string(),
    }
}

impl GatewaySession {
    /// Send one `callAction` frame
    pub async fn dispatch(&self, action: &ActionMessage) -> GatewayResult<()> {
        let envelope = Envelope::json(CALL_ACTION, action)?;
        self.send(envelope).await?;
        debug!(physical_id = %action.physical_id, call = %action.call, "Action sent");
        Ok(())
    }

    /// Run a command on a device on behalf of a user
    ///
    /// Requires write on the device. On success a `device` audit row holding
    /// the action JSON is appended.
    pub async fn call_device_action(
        &self,
        user_id: &str,
        device_id: &str,
        call: &str,
        params: &str,
    ) -> GatewayResult<ActionMessage> {
        let device = self
            .store()
            .device(device_id)?
            .ok_or_else(|| GatewayError::DeviceNotFound(device_id.to_string()))?;

        if !self
            .store()
            .has_permission(user_id, ResourceType::Device, &device.id, Capability::Write)?
        {
            return Err(GatewayError::Forbidden(device.id));
        }

        let action = action_message(&device, call, params);
        self.dispatch(&action).await?;
        info!(device_id = %device.id, call = %call, "Manual action sent to gateway");

        let value = serde_json::to_string(&action)?;
        if let Err(e) = self
            .store()
            .append_log(&LogEntry::new(LogType::Device, &device.id, value))
        {
            warn!(device_id = %device.id, "Failed to write audit log: {}", e);
        }
        Ok(action)
    }
}
