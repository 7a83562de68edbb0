//! hc-api: Auxiliary HTTP endpoints for hc-gateway
//!
//! Health check, a debug endpoint that runs canned queries through the
//! responder pipeline, and the stored-appointments listing.

pub mod handlers;
pub mod routes;

pub use routes::{ApiState, routes};
