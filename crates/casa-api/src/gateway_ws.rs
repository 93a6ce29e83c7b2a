//! Gateway link over a websocket
//!
//! One reader (the receive loop below) and one writer task per connection.
//! Everything that talks to the gateway goes through the session's sender,
//! which feeds the writer task.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use casa_gateway::{Envelope, GatewaySession, LINK_BUFFER};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::AppState;

/// GET /ws
pub(crate) async fn link_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.session))
}

async fn handle_socket(socket: WebSocket, session: Arc<GatewaySession>) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<Envelope>(LINK_BUFFER);
    let link_id = session.attach(tx).await;

    let send_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            let text = match envelope.encode() {
                Ok(text) => text,
                Err(e) => {
                    error!(action = %envelope.action, "Failed to encode frame: {}", e);
                    continue;
                }
            };
            debug!(action = %envelope.action, "Sending to gateway");
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = receiver.next().await {
        let decoded = match result {
            Ok(Message::Text(text)) => Envelope::decode(&text),
            Ok(Message::Binary(bytes)) => serde_json::from_slice::<Envelope>(&bytes),
            Ok(Message::Close(_)) => {
                info!(link_id, "Gateway closed the link");
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                error!(link_id, "Gateway link error: {}", e);
                break;
            }
        };

        match decoded {
            Ok(envelope) => {
                debug!(link_id, action = %envelope.action, "Received from gateway");
                session.handle_inbound(envelope).await;
            }
            Err(e) => {
                warn!(link_id, "Undecodable gateway frame, closing link: {}", e);
                break;
            }
        }
    }

    session.detach(link_id).await;
    send_task.abort();
    info!(link_id, "Gateway link closed");
}
