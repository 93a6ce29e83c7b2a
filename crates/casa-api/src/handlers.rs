//! HTTP handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use casa_core::{Capability, DiscoveredDevice, PluginConfig, ResourceType};
use casa_gateway::{ActionMessage, GatewayStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{require, AuthUser};
use crate::error::{api_error, discovery_error, gateway_error, store_error, ApiError};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
pub(crate) struct MessageResponse {
    message: &'static str,
    action: ActionMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CallActionRequest {
    device_id: String,
    #[serde(default)]
    action: String,
    #[serde(default)]
    params: String,
}

/// GET /health
pub(crate) async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /plugins
pub(crate) async fn get_plugins(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Json<Vec<PluginConfig>> {
    Json(state.session.catalog().plugins())
}

/// GET /gateways/:gateway_id/discover/:plugin
pub(crate) async fn discover_devices(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((gateway_id, plugin)): Path<(String, String)>,
) -> Result<Json<Vec<DiscoveredDevice>>, ApiError> {
    debug!(gateway_id = %gateway_id, plugin = %plugin, "Discovery requested");
    state
        .session
        .discover(&user_id, &gateway_id, &plugin)
        .await
        .map(Json)
        .map_err(discovery_error)
}

/// POST /gateways/:gateway_id/actions
pub(crate) async fn call_action(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(gateway_id): Path<String>,
    Json(req): Json<CallActionRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if req.action.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "missing_fields",
            "Missing field: action",
        ));
    }

    // The device must hang off the gateway named in the path
    let device = state
        .session
        .store()
        .device(&req.device_id)
        .map_err(store_error)?
        .filter(|d| d.gateway_id == gateway_id)
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "device_not_found",
                format!("Device not found: {}", req.device_id),
            )
        })?;

    let action = state
        .session
        .call_device_action(&user_id, &device.id, &req.action, &req.params)
        .await
        .map_err(gateway_error)?;

    Ok(Json(MessageResponse {
        message: "Action sent to gateway",
        action,
    }))
}

/// GET /gateways/:gateway_id/status
pub(crate) async fn gateway_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(gateway_id): Path<String>,
) -> Result<Json<GatewayStatus>, ApiError> {
    let store = state.session.store();
    let home_id = store
        .gateway_home(&gateway_id)
        .map_err(store_error)?
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                "gateway_not_found",
                format!("Gateway not found: {}", gateway_id),
            )
        })?;

    require(&state, &user_id, ResourceType::Home, &home_id, Capability::Read)?;

    Ok(Json(state.session.status().await))
}
