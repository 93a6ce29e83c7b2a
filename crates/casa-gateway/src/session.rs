//! The per-process gateway session

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use casa_core::{Catalog, DiscoveredDevice};
use casa_store::Store;
use casa_telemetry::TelemetryCache;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::client::GatewayClient;
use crate::error::{GatewayError, GatewayResult};
use crate::protocol::{Envelope, Inbound};

/// Outbound queue depth per link
pub const LINK_BUFFER: usize = 256;

const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

/// The currently attached link
struct LinkHandle {
    id: u64,
    tx: mpsc::Sender<Envelope>,
}

/// Snapshot of the link for status reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatus {
    pub connected: bool,
    pub address: Option<String>,
    pub plugins: usize,
}

/// Owner of the gateway link and everything scoped to it
///
/// Exactly one link is active at a time; attaching a new one replaces the
/// previous sender without any handoff.
pub struct GatewaySession {
    store: Arc<dyn Store>,
    cache: TelemetryCache,
    catalog: Catalog,
    client: GatewayClient,
    link: RwLock<Option<LinkHandle>>,
    next_link_id: AtomicU64,
    address: RwLock<Option<String>>,
    pub(crate) pending_discovery: Mutex<Option<oneshot::Sender<Vec<DiscoveredDevice>>>>,
    pub(crate) discovery_lock: Mutex<()>,
    pub(crate) discovery_timeout: Duration,
}

impl GatewaySession {
    pub fn new(store: Arc<dyn Store>, cache: TelemetryCache, client: GatewayClient) -> Self {
        Self {
            store,
            cache,
            catalog: Catalog::new(),
            client,
            link: RwLock::new(None),
            next_link_id: AtomicU64::new(1),
            address: RwLock::new(None),
            pending_discovery: Mutex::new(None),
            discovery_lock: Mutex::new(()),
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
        }
    }

    /// How long [`discover`](Self::discover) waits for the gateway's answer
    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn cache(&self) -> &TelemetryCache {
        &self.cache
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn client(&self) -> &GatewayClient {
        &self.client
    }

    /// Install a new outbound sender, replacing any previous link
    ///
    /// Returns the link id to pass to [`detach`](Self::detach).
    pub async fn attach(&self, tx: mpsc::Sender<Envelope>) -> u64 {
        let id = self.next_link_id.fetch_add(1, Ordering::SeqCst);
        let previous = self.link.write().await.replace(LinkHandle { id, tx });
        match previous {
            Some(old) => info!(link_id = id, replaced = old.id, "Gateway link replaced"),
            None => info!(link_id = id, "Gateway link attached"),
        }
        id
    }

    /// Drop the link if it is still the one identified by `id`
    pub async fn detach(&self, id: u64) {
        let mut link = self.link.write().await;
        if link.as_ref().map(|l| l.id) == Some(id) {
            *link = None;
            info!(link_id = id, "Gateway link detached");
        } else {
            debug!(link_id = id, "Stale link detach ignored");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.link.read().await.is_some()
    }

    /// Address announced in the last `newConnection`
    pub async fn address(&self) -> Option<String> {
        self.address.read().await.clone()
    }

    pub async fn status(&self) -> GatewayStatus {
        GatewayStatus {
            connected: self.is_connected().await,
            address: self.address().await,
            plugins: self.catalog.len(),
        }
    }

    /// Queue a frame on the active link
    ///
    /// Frames are written by the link's single writer task, so concurrent
    /// callers never interleave on the socket.
    pub async fn send(&self, envelope: Envelope) -> GatewayResult<()> {
        let tx = match self.link.read().await.as_ref() {
            Some(link) => link.tx.clone(),
            None => return Err(GatewayError::NotConnected),
        };
        tx.send(envelope)
            .await
            .map_err(|_| GatewayError::LinkClosed)
    }

    /// Route one inbound frame
    ///
    /// `newData` is ingested on its own task; the other actions are handled
    /// before returning. Body decode failures are logged and the frame is
    /// dropped.
    pub async fn handle_inbound(self: &Arc<Self>, envelope: Envelope) {
        let inbound = match Inbound::parse(&envelope) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(action = %envelope.action, "Dropping gateway frame: {}", e);
                return;
            }
        };

        match inbound {
            Inbound::NewConnection { address } => self.on_new_connection(address).await,
            Inbound::NewData(readings) => {
                let session = Arc::clone(self);
                tokio::spawn(async move {
                    session.ingest(readings).await;
                });
            }
            Inbound::DiscoveredDevices(devices) => self.complete_discovery(devices).await,
            Inbound::Unknown(action) => debug!(action = %action, "Ignoring unknown gateway action"),
        }
    }

    async fn on_new_connection(&self, address: String) {
        info!(address = %address, "Gateway announced itself");
        *self.address.write().await = Some(address.clone());

        match self.client.fetch_catalog(&address).await {
            Ok(configs) => {
                let added = self.catalog.merge(configs);
                info!(added, total = self.catalog.len(), "Plugin catalog refreshed");
            }
            Err(e) => error!(address = %address, "Failed to fetch plugin catalog: {}", e),
        }
    }

    pub(crate) async fn complete_discovery(&self, devices: Vec<DiscoveredDevice>) {
        match self.pending_discovery.lock().await.take() {
            Some(tx) => {
                debug!(count = devices.len(), "Discovery answered");
                let _ = tx.send(devices);
            }
            None => warn!("Received discoveredDevices with no discovery pending"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CALL_ACTION;
    use casa_store::SqliteStore;

    fn session() -> GatewaySession {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::open_in_memory().unwrap());
        GatewaySession::new(store, TelemetryCache::spawn(), GatewayClient::default())
    }

    #[tokio::test]
    async fn test_send_without_link() {
        let session = session();
        let err = session.send(Envelope::empty(CALL_ACTION)).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConnected));
    }

    #[tokio::test]
    async fn test_new_link_replaces_old() {
        let session = session();
        let (tx1, mut rx1) = mpsc::channel(4);
        let (tx2, mut rx2) = mpsc::channel(4);

        let first = session.attach(tx1).await;
        let second = session.attach(tx2).await;
        assert_ne!(first, second);

        session.send(Envelope::empty(CALL_ACTION)).await.unwrap();
        assert!(rx2.recv().await.is_some());
        assert!(rx1.try_recv().is_err());

        // The replaced link going away does not detach the new one
        session.detach(first).await;
        assert!(session.is_connected().await);

        session.detach(second).await;
        assert!(!session.is_connected().await);
    }

    #[tokio::test]
    async fn test_closed_link() {
        let session = session();
        let (tx, rx) = mpsc::channel(1);
        session.attach(tx).await;
        drop(rx);

        let err = session.send(Envelope::empty(CALL_ACTION)).await.unwrap_err();
        assert!(matches!(err, GatewayError::LinkClosed));
    }

    #[tokio::test]
    async fn test_unknown_action_ignored() {
        let session = Arc::new(session());
        session.handle_inbound(Envelope::new("hello", "x")).await;
        assert!(session.address().await.is_none());
    }
}
