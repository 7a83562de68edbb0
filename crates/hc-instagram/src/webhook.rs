//! Webhook routes for Instagram messaging events

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use hc_core::{Direction, MessageHandler, Origin, RecordStore};

use crate::api::{InstagramApi, WebhookPayload};

/// Shared state for the Instagram webhook
#[derive(Clone)]
pub struct InstagramState {
    pub handler: Arc<dyn MessageHandler>,
    pub api: Arc<InstagramApi>,
    pub store: Arc<RecordStore>,
}

/// Query parameters of Meta's verification request
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: String,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: String,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: String,
}

/// Build the Instagram webhook router
pub fn routes(state: Arc<InstagramState>) -> Router {
    Router::new()
        .route(
            "/webhook/instagram",
            get(verify_webhook).post(handle_webhook),
        )
        .with_state(state)
}

/// Webhook verification: echo the challenge when the shared secret matches
async fn verify_webhook(
    State(state): State<Arc<InstagramState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match state
        .api
        .verify_webhook(&params.mode, &params.verify_token, &params.challenge)
    {
        Ok(challenge) => challenge.into_response(),
        Err(_) => (StatusCode::FORBIDDEN, "Verification failed").into_response(),
    }
}

/// Handle incoming Instagram messaging events
async fn handle_webhook(
    State(state): State<Arc<InstagramState>>,
    Json(payload): Json<WebhookPayload>,
) -> Json<serde_json::Value> {
    for (sender_id, text) in payload.messages() {
        info!("Received Instagram message from {}", sender_id);

        let reply = state.handler.handle(Origin::Instagram, &sender_id, &text).await;

        match state.api.send_message(&sender_id, &reply).await {
            Ok(response) => {
                info!("Sent Instagram reply: {:?}", response.message_id);
                if let Err(e) =
                    state
                        .store
                        .log_chat(&sender_id, &reply, "", Direction::Outgoing)
                {
                    error!("Failed to log outgoing Instagram message: {}", e);
                }
            }
            Err(e) => {
                error!("Failed to send Instagram reply: {}", e);
            }
        }
    }

    Json(json!({ "status": "success" }))
}
