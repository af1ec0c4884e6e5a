//! Trigger WebSocket Handler
//!
//! GET /ws/trigger-update upgrades to a WebSocket that runs one trigger
//! session and is closed after the terminal message. Anything the client
//! sends is ignored.

use std::time::Duration;

use anklet_client::Connector;
use anklet_core::dto::session::SessionMessage;
use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::api::AppState;
use crate::service::trigger::{self, MessageSink, SinkClosed};

const CLOSE_GRACE: Duration = Duration::from_secs(2);

#[async_trait]
impl MessageSink for WebSocket {
    async fn deliver(&mut self, message: &SessionMessage) -> Result<(), SinkClosed> {
        let json = serde_json::to_string(message).map_err(|_| SinkClosed)?;
        WebSocket::send(self, Message::Text(json.into()))
            .await
            .map_err(|_| SinkClosed)
    }
}

/// GET /ws/trigger-update
pub async fn trigger_update<C: Connector>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<C>>,
) -> impl IntoResponse {
    let session_id = Uuid::new_v4();
    ws.on_upgrade(move |socket| {
        handle_socket(socket, state).instrument(info_span!("trigger", session = %session_id))
    })
}

async fn handle_socket<C: Connector>(mut socket: WebSocket, state: AppState<C>) {
    info!("WebSocket client connected");

    let Ok(_permit) = state.sessions.clone().acquire_owned().await else {
        let _ = socket
            .deliver(&SessionMessage::error("Server error: shutting down"))
            .await;
        return;
    };

    let last = trigger::run_session(state.connector.clone(), state.request.clone(), &mut socket).await;

    match last {
        Some(message) => {
            info!("Session finished with {:?}", message);
            close(&mut socket).await;
        }
        None => info!("WebSocket client disconnected"),
    }
}

/// Sends a close frame and drains the socket until the client answers it
async fn close(socket: &mut WebSocket) {
    if socket.send(Message::Close(None)).await.is_err() {
        return;
    }

    let drained = tokio::time::timeout(CLOSE_GRACE, async {
        while let Some(Ok(message)) = socket.recv().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    })
    .await;

    if drained.is_err() {
        debug!("Client did not acknowledge close");
    }
}
