//! Route definitions

use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use hc_core::{MessageHandler, RecordStore};

use crate::handlers::{debug_chat, health, list_appointments};

/// Shared state for the auxiliary endpoints
#[derive(Clone)]
pub struct ApiState {
    pub handler: Arc<dyn MessageHandler>,
    pub store: Arc<RecordStore>,
}

/// Create the auxiliary API router
pub fn routes(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Canned queries through the responder pipeline
        .route("/debug/chat", get(debug_chat))
        // Stored appointments
        .route("/api/appointments", get(list_appointments))
        .with_state(state)
}
