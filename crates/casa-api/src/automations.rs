//! Automation lifecycle routes
//!
//! Listing and reading need `read` on the home; creating, updating and
//! deleting need `write`. Every rule written is checked the same way the
//! scheduler parses it, and its trigger and action devices must belong to
//! the home.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use casa_automation::Automation;
use casa_core::{AutomationRecord, Capability, ResourceType};
use serde::{Deserialize, Serialize};
use tracing::info;
use ulid::Ulid;

use crate::auth::{require, AuthUser};
use crate::error::{api_error, store_error, ApiError};
use crate::AppState;

/// Body of create and update calls
///
/// On update, absent fields keep their stored value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AutomationRequest {
    name: Option<String>,
    status: Option<bool>,
    #[serde(alias = "trigger")]
    triggers: Option<Vec<String>>,
    #[serde(alias = "triggerKey")]
    trigger_keys: Option<Vec<String>>,
    #[serde(alias = "triggerValue")]
    trigger_values: Option<Vec<String>>,
    #[serde(alias = "triggerOperator")]
    trigger_operators: Option<Vec<String>>,
    #[serde(alias = "action")]
    actions: Option<Vec<String>>,
    #[serde(alias = "actionCall")]
    action_calls: Option<Vec<String>>,
    #[serde(alias = "actionValue")]
    action_values: Option<Vec<String>>,
}

impl AutomationRequest {
    fn apply(self, record: &mut AutomationRecord) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut record.name, self.name);
        set(&mut record.status, self.status);
        set(&mut record.triggers, self.triggers);
        set(&mut record.trigger_keys, self.trigger_keys);
        set(&mut record.trigger_values, self.trigger_values);
        set(&mut record.trigger_operators, self.trigger_operators);
        set(&mut record.actions, self.actions);
        set(&mut record.action_calls, self.action_calls);
        set(&mut record.action_values, self.action_values);
    }

    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.as_deref().map_or(true, str::is_empty) {
            missing.push("name");
        }
        if self.triggers.as_ref().map_or(true, Vec::is_empty) {
            missing.push("triggers");
        }
        if self.actions.as_ref().map_or(true, Vec::is_empty) {
            missing.push("actions");
        }
        missing
    }
}

#[derive(Serialize)]
pub(crate) struct MessageResponse {
    message: &'static str,
}

fn not_found(automation_id: &str) -> ApiError {
    api_error(
        StatusCode::NOT_FOUND,
        "automation_not_found",
        format!("Automation not found: {}", automation_id),
    )
}

/// Reject rules the scheduler would skip or that reference foreign devices
fn validate(state: &AppState, record: &AutomationRecord) -> Result<(), ApiError> {
    Automation::parse(record).map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, "invalid_automation", e.to_string())
    })?;

    let devices: HashSet<String> = state
        .session
        .store()
        .devices_for_home(&record.home_id)
        .map_err(store_error)?
        .into_iter()
        .map(|d| d.id)
        .collect();

    if let Some(id) = record.triggers.iter().find(|id| !devices.contains(*id)) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "trigger_device_not_found",
            format!("Trigger device can't be found: {}", id),
        ));
    }
    if let Some(id) = record.actions.iter().find(|id| !devices.contains(*id)) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "action_device_not_found",
            format!("Action device can't be found: {}", id),
        ));
    }
    Ok(())
}

/// GET /homes/:home_id/automations
pub(crate) async fn list_automations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(home_id): Path<String>,
) -> Result<Json<Vec<AutomationRecord>>, ApiError> {
    require(&state, &user_id, ResourceType::Home, &home_id, Capability::Read)?;

    state
        .session
        .store()
        .automations_for_home(&home_id)
        .map(Json)
        .map_err(store_error)
}

/// GET /homes/:home_id/automations/:automation_id
pub(crate) async fn get_automation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((home_id, automation_id)): Path<(String, String)>,
) -> Result<Json<AutomationRecord>, ApiError> {
    require(&state, &user_id, ResourceType::Home, &home_id, Capability::Read)?;

    state
        .session
        .store()
        .automation(&automation_id)
        .map_err(store_error)?
        .filter(|a| a.home_id == home_id)
        .map(Json)
        .ok_or_else(|| not_found(&automation_id))
}

/// POST /homes/:home_id/automations
pub(crate) async fn create_automation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(home_id): Path<String>,
    Json(req): Json<AutomationRequest>,
) -> Result<(StatusCode, Json<AutomationRecord>), ApiError> {
    require(&state, &user_id, ResourceType::Home, &home_id, Capability::Write)?;

    let missing = req.missing_fields();
    if !missing.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "missing_fields",
            format!("Missing fields: {}", missing.join(", ")),
        ));
    }

    let mut record = AutomationRecord {
        id: Ulid::new().to_string(),
        home_id,
        name: String::new(),
        status: true,
        triggers: Vec::new(),
        trigger_keys: Vec::new(),
        trigger_values: Vec::new(),
        trigger_operators: Vec::new(),
        actions: Vec::new(),
        action_calls: Vec::new(),
        action_values: Vec::new(),
        creator_id: user_id,
    };
    req.apply(&mut record);
    validate(&state, &record)?;

    state
        .session
        .store()
        .insert_automation(&record)
        .map_err(store_error)?;
    info!(automation_id = %record.id, home_id = %record.home_id, "Automation created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /homes/:home_id/automations/:automation_id
pub(crate) async fn update_automation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((home_id, automation_id)): Path<(String, String)>,
    Json(req): Json<AutomationRequest>,
) -> Result<Json<AutomationRecord>, ApiError> {
    require(&state, &user_id, ResourceType::Home, &home_id, Capability::Write)?;

    let store = state.session.store();
    let mut record = store
        .automation(&automation_id)
        .map_err(store_error)?
        .filter(|a| a.home_id == home_id)
        .ok_or_else(|| not_found(&automation_id))?;

    req.apply(&mut record);
    validate(&state, &record)?;

    if !store.update_automation(&record).map_err(store_error)? {
        return Err(not_found(&automation_id));
    }
    info!(automation_id = %record.id, "Automation updated");

    Ok(Json(record))
}

/// DELETE /homes/:home_id/automations/:automation_id
pub(crate) async fn delete_automation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((home_id, automation_id)): Path<(String, String)>,
) -> Result<Json<MessageResponse>, ApiError> {
    require(&state, &user_id, ResourceType::Home, &home_id, Capability::Write)?;

    if !state
        .session
        .store()
        .delete_automation(&home_id, &automation_id)
        .map_err(store_error)?
    {
        return Err(not_found(&automation_id));
    }
    info!(automation_id = %automation_id, "Automation deleted");

    Ok(Json(MessageResponse {
        message: "Automation deleted",
    }))
}
