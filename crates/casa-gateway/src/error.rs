//! Gateway and discovery errors

use casa_store::StoreError;
use casa_telemetry::TelemetryError;
use thiserror::Error;

/// Errors on the gateway link and its HTTP side channel
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("no gateway is connected")]
    NotConnected,

    #[error("gateway link closed while sending")]
    LinkClosed,

    #[error("failed to decode '{action}' body: {reason}")]
    Decode { action: String, reason: String },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("gateway HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("user lacks write permission on device {0}")]
    Forbidden(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("telemetry cache error: {0}")]
    Telemetry(#[from] TelemetryError),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced to the caller of a discovery request
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("gateway not found: {0}")]
    GatewayNotFound(String),

    #[error("user lacks write permission on home {0}")]
    Forbidden(String),

    #[error("no gateway is connected")]
    NotConnected,

    #[error("gateway did not answer discovery within {0:?}")]
    Timeout(std::time::Duration),

    #[error("discovery was cancelled")]
    Cancelled,

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
