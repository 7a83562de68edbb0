//! Error types for hc-ws

use thiserror::Error;

/// hc-ws error type
#[derive(Error, Debug)]
pub enum WsError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WsError>;
