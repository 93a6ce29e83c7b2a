//! Casa HTTP API
//!
//! Routes:
//!
//! - `GET /ws` - gateway link upgrade
//! - `GET /gateways/:gateway_id/discover/:plugin` - discover unregistered devices
//! - `POST /gateways/:gateway_id/actions` - run a command on a device
//! - `GET /gateways/:gateway_id/status` - link state
//! - `GET|POST /homes/:home_id/automations` - list or create automations
//! - `GET|PUT|DELETE /homes/:home_id/automations/:automation_id`
//! - `GET /plugins` - merged plugin catalog
//! - `GET /health`
//!
//! Everything except the link and health check requires
//! `Authorization: Bearer <token>`.

pub mod auth;
mod automations;
mod error;
mod gateway_ws;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use casa_gateway::GatewaySession;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ErrorResponse};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<GatewaySession>,
}

impl AppState {
    pub fn new(session: Arc<GatewaySession>) -> Self {
        Self { session }
    }
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(gateway_ws::link_handler))
        .route(
            "/gateways/:gateway_id/discover/:plugin",
            get(handlers::discover_devices),
        )
        .route("/gateways/:gateway_id/actions", post(handlers::call_action))
        .route("/gateways/:gateway_id/status", get(handlers::gateway_status))
        .route(
            "/homes/:home_id/automations",
            get(automations::list_automations).post(automations::create_automation),
        )
        .route(
            "/homes/:home_id/automations/:automation_id",
            get(automations::get_automation)
                .put(automations::update_automation)
                .delete(automations::delete_automation),
        )
        .route("/plugins", get(handlers::get_plugins))
        .route("/health", get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn start_server(
    state: AppState,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use casa_core::{AutomationRecord, Capability, Device, ResourceType};
    use casa_gateway::protocol::CALL_ACTION;
    use casa_gateway::{ActionMessage, Envelope, GatewayClient};
    use casa_store::SqliteStore;
    use casa_telemetry::TelemetryCache;
    use serde_json::Value;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_home("h1", "Home").unwrap();
        store.insert_room("r1", "h1", "Kitchen").unwrap();
        store.insert_gateway("gw1", "h1", "Main").unwrap();
        store
            .insert_device(&Device {
                id: "d1".to_string(),
                gateway_id: "gw1".to_string(),
                room_id: "r1".to_string(),
                name: "Kettle".to_string(),
                physical_id: "0x01".to_string(),
                physical_name: "plug".to_string(),
                plugin: "zigbee".to_string(),
                config: String::new(),
                icon: String::new(),
            })
            .unwrap();
        store
            .insert_device(&Device {
                id: "d2".to_string(),
                gateway_id: "gw1".to_string(),
                room_id: "r1".to_string(),
                name: "Thermometer".to_string(),
                physical_id: "0x02".to_string(),
                physical_name: "sensor".to_string(),
                plugin: "zigbee".to_string(),
                config: String::new(),
                icon: String::new(),
            })
            .unwrap();
        store.insert_home("h2", "Cabin").unwrap();
        store.insert_room("r2", "h2", "Porch").unwrap();
        store
            .insert_device(&Device {
                id: "d9".to_string(),
                gateway_id: "gw1".to_string(),
                room_id: "r2".to_string(),
                name: "Porch light".to_string(),
                physical_id: "0x09".to_string(),
                physical_name: "plug".to_string(),
                plugin: "zigbee".to_string(),
                config: String::new(),
                icon: String::new(),
            })
            .unwrap();
        store
            .grant_permission("u1", ResourceType::Home, "h1", &[Capability::Read])
            .unwrap();
        store
            .grant_permission("u3", ResourceType::Home, "h1", &[Capability::Read, Capability::Write])
            .unwrap();
        store.insert_token("tok-u3", "u3").unwrap();
        store
            .grant_permission("u1", ResourceType::Device, "d1", &[Capability::Write])
            .unwrap();
        store.insert_token("tok-u1", "u1").unwrap();
        store.insert_token("tok-u2", "u2").unwrap();

        let session = GatewaySession::new(
            Arc::new(store),
            TelemetryCache::spawn(),
            GatewayClient::default(),
        );
        AppState::new(Arc::new(session))
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_action(token: &str, gateway_id: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/gateways/{}/actions", gateway_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token));
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn seeded_rule(id: &str, home_id: &str, trigger: &str) -> AutomationRecord {
        AutomationRecord {
            id: id.to_string(),
            home_id: home_id.to_string(),
            name: format!("rule {}", id),
            status: true,
            triggers: vec![trigger.to_string()],
            trigger_keys: vec!["temp".to_string()],
            trigger_values: vec![">20".to_string()],
            trigger_operators: vec![],
            actions: vec!["d1".to_string()],
            action_calls: vec!["turnOn".to_string()],
            action_values: vec![String::new()],
            creator_id: "u3".to_string(),
        }
    }

    fn new_rule() -> Value {
        serde_json::json!({
            "name": "Warm kitchen",
            "triggers": ["d2", "d2"],
            "triggerKeys": ["temp", "humidity"],
            "triggerValues": [">20", "<40"],
            "triggerOperators": ["AND"],
            "actions": ["d1"],
            "actionCalls": ["turnOn"],
            "actionValues": [""]
        })
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state());

        let response = app.oneshot(get("/health", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let app = create_router(create_test_state());

        let response = app.oneshot(get("/plugins", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["code"], "unauthorized");
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthorized() {
        let app = create_router(create_test_state());

        let response = app.oneshot(get("/plugins", Some("nope"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_plugins_empty_before_gateway_connects() {
        let app = create_router(create_test_state());

        let response = app.oneshot(get("/plugins", Some("tok-u1"))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_gateway_status() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(get("/gateways/gw1/status", Some("tok-u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["connected"], false);
        assert_eq!(body["plugins"], 0);
    }

    #[tokio::test]
    async fn test_gateway_status_requires_read() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(get("/gateways/gw1/status", Some("tok-u2")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_gateway_status_unknown_gateway() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(get("/gateways/gw9/status", Some("tok-u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "gateway_not_found");
    }

    #[tokio::test]
    async fn test_discover_unknown_gateway() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(get("/gateways/gw9/discover/zigbee", Some("tok-u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_discover_requires_write_on_home() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(get("/gateways/gw1/discover/zigbee", Some("tok-u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_call_action_without_link() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(post_action(
                "tok-u1",
                "gw1",
                serde_json::json!({"deviceId": "d1", "action": "turnOn"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["code"], "gateway_not_connected");
    }

    #[tokio::test]
    async fn test_call_action_sends_to_gateway() {
        let state = create_test_state();
        let (tx, mut rx) = mpsc::channel::<Envelope>(4);
        state.session.attach(tx).await;
        let app = create_router(state);

        let response = app
            .oneshot(post_action(
                "tok-u1",
                "gw1",
                serde_json::json!({"deviceId": "d1", "action": "turnOn", "params": "50"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Action sent to gateway");

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.action, CALL_ACTION);
        let msg: ActionMessage = envelope.body_json().unwrap();
        assert_eq!(msg.physical_id, "0x01");
        assert_eq!(msg.call, "turnOn");
        assert_eq!(msg.params, "50");
    }

    #[tokio::test]
    async fn test_call_action_missing_action() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(post_action(
                "tok-u1",
                "gw1",
                serde_json::json!({"deviceId": "d1"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "missing_fields");
    }

    #[tokio::test]
    async fn test_call_action_device_on_other_gateway() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(post_action(
                "tok-u1",
                "gw2",
                serde_json::json!({"deviceId": "d1", "action": "turnOn"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "device_not_found");
    }

    #[tokio::test]
    async fn test_call_action_forbidden() {
        let state = create_test_state();
        let (tx, _rx) = mpsc::channel::<Envelope>(4);
        state.session.attach(tx).await;
        let app = create_router(state);

        let response = app
            .oneshot(post_action(
                "tok-u2",
                "gw1",
                serde_json::json!({"deviceId": "d1", "action": "turnOn"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_and_read_automation() {
        let state = create_test_state();

        let response = create_router(state.clone())
            .oneshot(request("POST", "/homes/h1/automations", "tok-u3", Some(new_rule())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json_body(response).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());
        assert_eq!(created["creatorId"], "u3");
        assert_eq!(created["status"], true);

        let stored = state.session.store().automation(&id).unwrap().unwrap();
        assert_eq!(stored.trigger_operators, vec!["AND"]);

        let response = create_router(state.clone())
            .oneshot(get("/homes/h1/automations", Some("tok-u1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list = json_body(response).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], id.as_str());

        let response = create_router(state)
            .oneshot(get(&format!("/homes/h1/automations/{}", id), Some("tok-u1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["name"], "Warm kitchen");
    }

    #[tokio::test]
    async fn test_create_automation_requires_write() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(request("POST", "/homes/h1/automations", "tok-u1", Some(new_rule())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_automations_requires_read() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(get("/homes/h1/automations", Some("tok-u2")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_automation_missing_fields() {
        let app = create_router(create_test_state());

        let response = app
            .oneshot(request(
                "POST",
                "/homes/h1/automations",
                "tok-u3",
                Some(serde_json::json!({"name": "Empty"})),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "missing_fields");
    }

    #[tokio::test]
    async fn test_create_automation_operator_count() {
        let state = create_test_state();
        let mut rule = new_rule();
        rule["triggerOperators"] = serde_json::json!([]);

        let response = create_router(state.clone())
            .oneshot(request("POST", "/homes/h1/automations", "tok-u3", Some(rule)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "invalid_automation");
        assert!(state.session.store().automations().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_automation_devices_must_be_in_home() {
        let state = create_test_state();

        let mut rule = new_rule();
        rule["triggers"] = serde_json::json!(["d2", "d9"]);
        let response = create_router(state.clone())
            .oneshot(request("POST", "/homes/h1/automations", "tok-u3", Some(rule)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "trigger_device_not_found");

        let mut rule = new_rule();
        rule["actions"] = serde_json::json!(["missing"]);
        let response = create_router(state)
            .oneshot(request("POST", "/homes/h1/automations", "tok-u3", Some(rule)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["code"], "action_device_not_found");
    }

    #[tokio::test]
    async fn test_update_automation_keeps_absent_fields() {
        let state = create_test_state();
        let store = state.session.store().clone();
        store.insert_automation(&seeded_rule("a1", "h1", "d2")).unwrap();

        let response = create_router(state.clone())
            .oneshot(request(
                "PUT",
                "/homes/h1/automations/a1",
                "tok-u3",
                Some(serde_json::json!({"name": "Renamed", "status": false})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stored = store.automation("a1").unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert!(!stored.status);
        assert_eq!(stored.trigger_values, vec![">20"]);
        assert_eq!(stored.actions, vec!["d1"]);

        // A second trigger without an operator is rejected and nothing changes
        let response = create_router(state.clone())
            .oneshot(request(
                "PUT",
                "/homes/h1/automations/a1",
                "tok-u3",
                Some(serde_json::json!({
                    "triggers": ["d2", "d2"],
                    "triggerKeys": ["temp", "temp"],
                    "triggerValues": [">20", "<30"]
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.automation("a1").unwrap().unwrap().triggers, vec!["d2"]);

        let response = create_router(state)
            .oneshot(request(
                "PUT",
                "/homes/h1/automations/a9",
                "tok-u3",
                Some(serde_json::json!({"name": "Ghost"})),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_automation() {
        let state = create_test_state();
        let store = state.session.store().clone();
        store.insert_automation(&seeded_rule("a1", "h1", "d2")).unwrap();

        let response = create_router(state.clone())
            .oneshot(request("DELETE", "/homes/h1/automations/a1", "tok-u1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = create_router(state.clone())
            .oneshot(request("DELETE", "/homes/h1/automations/a1", "tok-u3", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["message"], "Automation deleted");
        assert!(store.automation("a1").unwrap().is_none());

        let response = create_router(state)
            .oneshot(request("DELETE", "/homes/h1/automations/a1", "tok-u3", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_automation_of_other_home_hidden() {
        let state = create_test_state();
        state
            .session
            .store()
            .insert_automation(&seeded_rule("a2", "h2", "d9"))
            .unwrap();

        let response = create_router(state)
            .oneshot(get("/homes/h1/automations/a2", Some("tok-u1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "automation_not_found");
    }
}
