//! hc-instagram: Instagram gateway for hc-gateway
//!
//! Receives Meta webhook events for Instagram Direct Messages, runs them
//! through the shared handler and replies via the Graph API.

pub mod api;
pub mod error;
pub mod webhook;

pub use api::InstagramApi;
pub use error::{InstagramError, Result};
pub use webhook::{InstagramState, routes};
