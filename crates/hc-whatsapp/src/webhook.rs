//! Webhook routes for receiving WhatsApp messages from Twilio

use std::sync::Arc;

use axum::{
    Router,
    extract::{Form, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{info, warn};

use hc_core::phone::normalize_phone;
use hc_core::{MessageHandler, Origin};

use crate::twilio::{IncomingMessage, TwilioClient};
use crate::twiml;

/// Shared state for the WhatsApp webhook
#[derive(Clone)]
pub struct WhatsAppState {
    pub handler: Arc<dyn MessageHandler>,
    pub twilio: Arc<TwilioClient>,
    pub validate_signatures: bool,
}

/// Build the WhatsApp webhook router
pub fn routes(state: Arc<WhatsAppState>) -> Router {
    Router::new()
        .route("/webhook/whatsapp", post(handle_webhook))
        .with_state(state)
}

/// Handle an incoming WhatsApp webhook
async fn handle_webhook(
    State(state): State<Arc<WhatsAppState>>,
    uri: Uri,
    headers: HeaderMap,
    Form(msg): Form<IncomingMessage>,
) -> Response {
    if state.validate_signatures {
        let signature = headers
            .get("X-Twilio-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        // Twilio concatenates the sorted form keys and values after the URL
        let params = format!(
            "Body{}From{}MessageSid{}",
            msg.body, msg.from, msg.message_sid
        );

        if !state
            .twilio
            .verify_signature(&uri.to_string(), &params, signature)
        {
            warn!("Rejected WhatsApp webhook with bad signature from {}", msg.from);
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let body = process(&state, &msg).await;
    xml(body)
}

/// Run one webhook message through the pipeline and render the TwiML reply
pub(crate) async fn process(state: &WhatsAppState, msg: &IncomingMessage) -> String {
    info!("Received WhatsApp message from {}", msg.from);

    let body = msg.body.trim();
    if body.is_empty() {
        return twiml::empty_response();
    }

    let Some(phone) = normalize_phone(&msg.from) else {
        warn!("Invalid sender phone number: {}", msg.from);
        return twiml::message_response("Invalid phone number format.");
    };

    let reply = state.handler.handle(Origin::WhatsApp, &phone, body).await;
    twiml::message_response(&reply)
}

fn xml(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}
