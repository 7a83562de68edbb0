//! The seam between channel adapters and the message-processing pipeline

use async_trait::async_trait;

use crate::store::Direction;

/// Which channel an inbound message arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    WhatsApp,
    Instagram,
    Website,
}

impl Origin {
    /// Chat-log direction for inbound messages on this channel
    pub fn direction(&self) -> Direction {
        match self {
            Origin::Website => Direction::WebsiteChat,
            _ => Direction::Incoming,
        }
    }
}

/// Processes one inbound message and produces the reply text.
///
/// Implementations never fail: upstream errors are rendered as a fixed
/// apology string so the assistant always answers with something.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, origin: Origin, sender: &str, text: &str) -> String;
}
