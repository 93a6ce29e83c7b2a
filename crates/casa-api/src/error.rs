//! Structured error responses

use axum::http::StatusCode;
use axum::Json;
use casa_gateway::{DiscoveryError, GatewayError};
use serde::Serialize;
use tracing::{error, warn};

/// Error body: a stable machine-readable code and a human message
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            code,
            message: message.into(),
        }),
    )
}

pub(crate) fn store_error(e: casa_store::StoreError) -> ApiError {
    error!("Store error: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "Database error")
}

pub(crate) fn gateway_error(e: GatewayError) -> ApiError {
    match e {
        GatewayError::NotConnected | GatewayError::LinkClosed => {
            warn!("Gateway unavailable: {}", e);
            api_error(StatusCode::SERVICE_UNAVAILABLE, "gateway_not_connected", e.to_string())
        }
        GatewayError::DeviceNotFound(_) => {
            api_error(StatusCode::NOT_FOUND, "device_not_found", e.to_string())
        }
        GatewayError::Forbidden(_) => api_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        GatewayError::Http(_) => {
            warn!("Gateway HTTP call failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, "gateway_unreachable", e.to_string())
        }
        GatewayError::Store(e) => store_error(e),
        other => {
            error!("Gateway error: {}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "gateway_error", other.to_string())
        }
    }
}

pub(crate) fn discovery_error(e: DiscoveryError) -> ApiError {
    match e {
        DiscoveryError::GatewayNotFound(_) => {
            api_error(StatusCode::NOT_FOUND, "gateway_not_found", e.to_string())
        }
        DiscoveryError::Forbidden(_) => api_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        DiscoveryError::NotConnected | DiscoveryError::Cancelled => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, "gateway_not_connected", e.to_string())
        }
        DiscoveryError::Timeout(_) => {
            warn!("{}", e);
            api_error(StatusCode::GATEWAY_TIMEOUT, "discovery_timeout", e.to_string())
        }
        DiscoveryError::Gateway(e) => gateway_error(e),
        DiscoveryError::Store(e) => store_error(e),
    }
}
