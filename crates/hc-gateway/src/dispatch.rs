//! Message dispatcher
//!
//! One pipeline behind every channel adapter: sanitize the inbound text,
//! route payment requests, run the conversation responder, optionally let
//! the LLM answer free-text questions the script could not, and log the
//! interaction. Component failures are logged and rendered as a fixed
//! apology string at this boundary.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, warn};

use hc_core::phone::sanitize_message;
use hc_core::{
    Direction, MessageHandler, Origin, RecordStore, ReplyKind, Responder, ServiceCatalog,
    SmartReply,
};
use hc_payments::{PaymentError, PaymentLinkIssuer};

/// Fixed user-facing reply when anything fails
const APOLOGY: &str = "Sorry, something went wrong. Please try again later.";

/// Replies for the payment flow's failure modes
const PAYMENT_SERVICE_MISSING: &str = "Unable to find the specified service.";
const PAYMENT_FAILED: &str = "Unable to generate payment link. Please try again.";

/// The message pipeline shared by every channel
pub struct Dispatcher {
    responder: Responder,
    issuer: PaymentLinkIssuer,
    smart: Option<SmartReply>,
    catalog: Arc<ServiceCatalog>,
    store: Arc<RecordStore>,
}

impl Dispatcher {
    pub fn new(
        responder: Responder,
        issuer: PaymentLinkIssuer,
        smart: Option<SmartReply>,
        catalog: Arc<ServiceCatalog>,
        store: Arc<RecordStore>,
    ) -> Self {
        Self {
            responder,
            issuer,
            smart,
            catalog,
            store,
        }
    }

    async fn process(&self, sender: &str, text: &str) -> hc_core::Result<String> {
        // Payment requests short-circuit the scripted flow
        if text.to_lowercase().contains("pay") {
            return Ok(self.payment_reply(sender).await);
        }

        let reply = self.responder.respond(sender, text).await?;

        // Nothing in the script or catalog matched; let the model try
        // before falling back to the package listing.
        if reply.kind == ReplyKind::Listing {
            if let Some(smart) = &self.smart {
                match smart.reply(&self.catalog, text).await {
                    Ok(answer) => return Ok(answer),
                    Err(e) => {
                        warn!("Smart reply failed, using listing fallback: {}", e);
                    }
                }
            }
        }

        Ok(reply.text)
    }

    async fn payment_reply(&self, sender: &str) -> String {
        match self.issuer.create_link(sender, None).await {
            Ok(url) => format!("💳 Complete your payment: {}", url),
            Err(PaymentError::ServiceNotFound(name)) => {
                warn!("Payment request for unknown service: {}", name);
                PAYMENT_SERVICE_MISSING.to_string()
            }
            Err(e) => {
                error!("Payment link creation failed: {}", e);
                PAYMENT_FAILED.to_string()
            }
        }
    }
}

#[async_trait]
impl MessageHandler for Dispatcher {
    async fn handle(&self, origin: Origin, sender: &str, text: &str) -> String {
        let text = sanitize_message(text);

        match self.process(sender, &text).await {
            Ok(reply) => {
                if let Err(e) = self.store.log_chat(sender, &text, &reply, origin.direction()) {
                    error!("Failed to log chat interaction: {}", e);
                }
                reply
            }
            Err(e) => {
                error!("Message processing failed for {}: {}", sender, e);
                if let Err(log_err) =
                    self.store
                        .log_chat(sender, &text, &e.to_string(), Direction::Error)
                {
                    error!("Failed to log error interaction: {}", log_err);
                }
                APOLOGY.to_string()
            }
        }
    }
}
