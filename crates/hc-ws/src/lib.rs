//! hc-ws: Website chat gateway for hc-gateway
//!
//! WebSocket endpoint for the browser widget. Each connection gets a
//! generated session id that doubles as the sender id for conversation
//! state and chat logging.

pub mod connections;
pub mod error;
pub mod handler;
pub mod message;

pub use connections::ConnectionMap;
pub use error::{Result, WsError};
pub use handler::{WsState, routes};
pub use message::{ClientFrame, ServerFrame};
