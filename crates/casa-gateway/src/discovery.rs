//! Discovery coordinator

use std::collections::HashSet;

use casa_core::{Capability, DiscoveredDevice, ResourceType};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::{DiscoveryError, DiscoveryResult};
use crate::protocol::{Envelope, DISCOVER_DEVICES};
use crate::session::GatewaySession;

impl GatewaySession {
    /// Ask the gateway for devices of `plugin` that are not registered yet
    ///
    /// The plugin is named through the gateway's HTTP API, then
    /// `discoverDevices` goes out on the link and the call waits for the
    /// matching `discoveredDevices`. Requests are serialized since answers
    /// carry no correlation id.
    pub async fn discover(
        &self,
        user_id: &str,
        gateway_id: &str,
        plugin: &str,
    ) -> DiscoveryResult<Vec<DiscoveredDevice>> {
        let home_id = self
            .store()
            .gateway_home(gateway_id)?
            .ok_or_else(|| DiscoveryError::GatewayNotFound(gateway_id.to_string()))?;

        if !self
            .store()
            .has_permission(user_id, ResourceType::Home, &home_id, Capability::Write)?
        {
            return Err(DiscoveryError::Forbidden(home_id));
        }

        let _guard = self.discovery_lock.lock().await;

        let address = match self.address().await {
            Some(address) if self.is_connected().await => address,
            _ => return Err(DiscoveryError::NotConnected),
        };

        self.client().prepare_discovery(&address, plugin).await?;

        let (tx, rx) = oneshot::channel();
        *self.pending_discovery.lock().await = Some(tx);

        if let Err(e) = self.send(Envelope::empty(DISCOVER_DEVICES)).await {
            self.pending_discovery.lock().await.take();
            return Err(e.into());
        }

        let reported = match tokio::time::timeout(self.discovery_timeout, rx).await {
            Ok(Ok(devices)) => devices,
            Ok(Err(_)) => return Err(DiscoveryError::Cancelled),
            Err(_) => {
                self.pending_discovery.lock().await.take();
                warn!(plugin = %plugin, "Discovery timed out");
                return Err(DiscoveryError::Timeout(self.discovery_timeout));
            }
        };

        let registered: HashSet<String> = self
            .store()
            .devices_for_home(&home_id)?
            .into_iter()
            .map(|d| d.physical_id)
            .collect();

        let total = reported.len();
        let fresh: Vec<_> = reported
            .into_iter()
            .filter(|d| !registered.contains(&d.physical_id))
            .collect();

        info!(plugin = %plugin, reported = total, unregistered = fresh.len(), "Discovery complete");
        Ok(fresh)
    }
}
