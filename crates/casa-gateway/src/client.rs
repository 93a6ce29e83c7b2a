//! HTTP side channel to the gateway

use std::time::Duration;

use casa_core::PluginConfig;
use reqwest::Client;
use tracing::debug;

use crate::error::GatewayResult;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the gateway's own HTTP API
///
/// Used to fetch the plugin catalog after `newConnection` and for the
/// synchronous prep call that names the plugin before `discoverDevices`.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    timeout: Duration,
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl GatewayClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            timeout,
        }
    }

    /// `GET {address}/v1/configs`
    pub async fn fetch_catalog(&self, address: &str) -> GatewayResult<Vec<PluginConfig>> {
        let url = format!("{}/v1/configs", base_url(address));
        debug!(url = %url, "Fetching plugin catalog");

        let configs = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json::<Option<Vec<PluginConfig>>>()
            .await?;
        Ok(configs.unwrap_or_default())
    }

    /// `GET {address}/v1/discover/{plugin}`
    pub async fn prepare_discovery(&self, address: &str, plugin: &str) -> GatewayResult<()> {
        let url = format!("{}/v1/discover/{}", base_url(address), plugin);
        debug!(url = %url, "Preparing discovery");

        self.http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Gateways announce a bare `host:port`; a full URL is taken as is
fn base_url(address: &str) -> String {
    let address = address.trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}
