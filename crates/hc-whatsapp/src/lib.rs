//! hc-whatsapp: WhatsApp gateway for hc-gateway via the Twilio API
//!
//! Receives form-encoded Twilio webhooks, runs the inbound message
//! through the shared handler and answers with a TwiML document.

pub mod error;
pub mod twilio;
pub mod twiml;
pub mod webhook;

pub use error::{Result, WhatsAppError};
pub use twilio::TwilioClient;
pub use webhook::{WhatsAppState, routes};
