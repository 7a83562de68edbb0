//! Active connection tracking
//!
//! One entry per open browser session, keyed by the generated session id.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc};
use tracing::debug;

/// Shared map of open WebSocket connections
#[derive(Debug, Clone, Default)]
pub struct ConnectionMap {
    inner: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<String>>>>,
}

impl ConnectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel
    pub async fn insert(&self, session_id: &str, tx: mpsc::UnboundedSender<String>) {
        let mut connections = self.inner.write().await;
        connections.insert(session_id.to_string(), tx);
        debug!("Registered connection {}", session_id);
    }

    /// Drop a connection on disconnect
    pub async fn remove(&self, session_id: &str) {
        let mut connections = self.inner.write().await;
        connections.remove(session_id);
        debug!("Removed connection {}", session_id);
    }

    /// Send a raw frame to one session, if still connected
    pub async fn send_to(&self, session_id: &str, frame: String) -> bool {
        let connections = self.inner.read().await;
        match connections.get(session_id) {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Send a raw frame to every connected session
    pub async fn broadcast(&self, frame: &str) {
        let connections = self.inner.read().await;
        for tx in connections.values() {
            let _ = tx.send(frame.to_string());
        }
    }

    /// Number of open connections
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
