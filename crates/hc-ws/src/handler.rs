//! WebSocket connection handler

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use hc_core::{MessageHandler, Origin};

use crate::connections::ConnectionMap;
use crate::message::{ClientFrame, ServerFrame};

/// Shared state for the website chat endpoint
#[derive(Clone)]
pub struct WsState {
    pub handler: Arc<dyn MessageHandler>,
    pub connections: ConnectionMap,
}

/// Build the website chat router
pub fn routes(state: Arc<WsState>) -> Router {
    Router::new()
        .route("/ws/chat", get(websocket_handler))
        .with_state(state)
}

/// Handle a WebSocket upgrade request
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one established connection until it closes
async fn handle_socket(socket: WebSocket, state: Arc<WsState>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    info!("New website chat connection: {}", session_id);

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state.connections.insert(&session_id, tx.clone()).await;

    // Forward queued frames to the client
    let session_id_send = session_id.clone();
    let send_task = async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(WsMessage::Text(frame.into())).await.is_err() {
                break;
            }
        }
        debug!("Send task ended for session: {}", session_id_send);
    };

    // Process inbound frames
    let session_id_recv = session_id.clone();
    let state_recv = state.clone();
    let recv_task = async move {
        while let Some(msg) = ws_rx.next().await {
            match msg {
                Ok(WsMessage::Text(text)) => {
                    let frame = process_frame(&state_recv, &session_id_recv, &text).await;
                    if tx.send(frame.to_json()).is_err() {
                        break;
                    }
                }
                Ok(WsMessage::Close(_)) => {
                    info!("Client closed connection: {}", session_id_recv);
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    };

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    state.connections.remove(&session_id).await;
    info!("Website chat connection closed: {}", session_id);
}

/// Turn one inbound text frame into the reply frame
async fn process_frame(state: &WsState, session_id: &str, text: &str) -> ServerFrame {
    let frame = match ClientFrame::parse(text) {
        Ok(frame) => frame,
        Err(e) => {
            debug!("Malformed frame from {}: {}", session_id, e);
            return ServerFrame::system("Sorry, an error occurred: invalid message format");
        }
    };

    let message = frame.message.trim();
    if message.is_empty() {
        return ServerFrame::system("Please type a message.");
    }

    let reply = state.handler.handle(Origin::Website, session_id, message).await;
    ServerFrame::ai(reply)
}
