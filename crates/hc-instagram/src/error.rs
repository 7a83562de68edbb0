//! Error types for hc-instagram

use thiserror::Error;

/// hc-instagram error type
#[derive(Error, Debug)]
pub enum InstagramError {
    #[error("Graph API error: {0}")]
    GraphApi(String),

    #[error("Webhook verification failed")]
    WebhookVerificationFailed,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, InstagramError>;
