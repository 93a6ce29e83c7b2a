//! Bearer token identity

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use casa_core::{Capability, ResourceType};

use crate::error::{api_error, store_error, ApiError};
use crate::AppState;

/// The user behind the request's bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                api_error(StatusCode::UNAUTHORIZED, "unauthorized", "Missing bearer token")
            })?;

        match state.session.store().user_for_token(token) {
            Ok(Some(user_id)) => Ok(AuthUser(user_id)),
            Ok(None) => Err(api_error(
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Invalid token",
            )),
            Err(e) => Err(store_error(e)),
        }
    }
}

/// Reject with 403 unless the user holds `capability` on the resource
pub(crate) fn require(
    state: &AppState,
    user_id: &str,
    resource_type: ResourceType,
    resource_id: &str,
    capability: Capability,
) -> Result<(), ApiError> {
    let allowed = state
        .session
        .store()
        .has_permission(user_id, resource_type, resource_id, capability)
        .map_err(store_error)?;

    if allowed {
        Ok(())
    } else {
        Err(api_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("{} permission on {} {} is required", capability, resource_type.as_str(), resource_id),
        ))
    }
}
