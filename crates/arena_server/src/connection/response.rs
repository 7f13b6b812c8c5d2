//! Transport-side implementation of the core's delivery seam.
//!
//! Bridges the connection manager to `arena_core`'s [`ChannelSender`]
//! trait: payloads from the fanout are reshaped into the wire message
//! format and pushed to the owning socket. Delivery stays best-effort;
//! a failed push is reported back as a string for the fanout to log.

use crate::connection::ConnectionManager;
use crate::messaging::OutboundMessage;
use arena_core::{ChannelSender, OutboundPayload, PlayerId};
use async_trait::async_trait;
use std::sync::Arc;

/// [`ChannelSender`] backed by the WebSocket connection manager.
#[derive(Clone)]
pub struct ArenaChannelSender {
    connection_manager: Arc<ConnectionManager>,
}

impl ArenaChannelSender {
    /// Creates a sender over the given connection manager.
    pub fn new(connection_manager: Arc<ConnectionManager>) -> Self {
        Self { connection_manager }
    }
}

#[async_trait]
impl ChannelSender for ArenaChannelSender {
    async fn send(&self, actor: PlayerId, payload: OutboundPayload) -> Result<(), String> {
        let message = OutboundMessage::from(payload);
        let text = serde_json::to_string(&message)
            .map_err(|e| format!("Failed to serialize notification: {e}"))?;
        self.connection_manager
            .send_to_connection(actor, &text)
            .await
            .map_err(|e| e.to_string())
    }
}
