//! WebSocket frame types
//!
//! The browser widget sends `{"message": ...}` frames and receives
//! `{"sender": "ai", "message": ...}` replies. Processing failures are
//! reported as frames from "system".

use serde::{Deserialize, Serialize};

/// Frame from the browser
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    #[serde(default)]
    pub message: String,
}

impl ClientFrame {
    /// Parse a raw text frame off the wire
    pub fn parse(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Frame to the browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerFrame {
    pub sender: String,
    pub message: String,
}

impl ServerFrame {
    /// An assistant reply
    pub fn ai(message: impl Into<String>) -> Self {
        Self {
            sender: "ai".to_string(),
            message: message.into(),
        }
    }

    /// A system notice (errors, malformed input)
    pub fn system(message: impl Into<String>) -> Self {
        Self {
            sender: "system".to_string(),
            message: message.into(),
        }
    }

    /// Serialize for the wire; the frame shape makes this infallible
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
