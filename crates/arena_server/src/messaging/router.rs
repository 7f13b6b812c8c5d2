//! Message routing: parses inbound frames and drives the core engine.
//!
//! The router is the seam between the transport and `arena_core`. It
//! parses the JSON frame, hands the dispatcher a [`CommandRequest`], and
//! delivers the committed outcome through the fanout. Dispatch
//! rejections never propagate as faults: they are converted into a
//! caller-directed error notice, because the actual result of every
//! command travels over the broadcast channel rather than a synchronous
//! response.

use crate::error::ServerError;
use crate::messaging::InboundMessage;
use arena_core::{
    ChannelSender, CommandRequest, Dispatcher, Fanout, OutboundPayload, PlayerId, RoomRegistry,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Routes inbound frames to the dispatcher and outcomes to the fanout.
pub struct MessageRouter {
    dispatcher: Dispatcher,
    fanout: Fanout,
}

impl MessageRouter {
    /// Creates a router over a shared registry and transport sender.
    pub fn new(registry: Arc<RoomRegistry>, sender: Arc<dyn ChannelSender>) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry.clone()),
            fanout: Fanout::new(registry, sender),
        }
    }

    /// Handles one raw text frame from a connection.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw message text from the client (expected JSON)
    /// * `actor` - The connection the frame arrived on
    ///
    /// # Errors
    ///
    /// `ServerError::Serialization` when the frame is not a valid
    /// message. Game-level rejections do not surface here; they answer
    /// the caller through its own channel.
    pub async fn route_message(&self, text: &str, actor: PlayerId) -> Result<(), ServerError> {
        let message: InboundMessage = serde_json::from_str(text)
            .map_err(|e| ServerError::Serialization(format!("Invalid JSON: {e}")))?;

        debug!("routing '{}' from {}", message.command, actor);

        let request = CommandRequest {
            actor,
            command: message.command,
            argument: message.argument,
            identity: message.user_info,
            state: message.user_status,
        };

        match self.dispatcher.dispatch(request) {
            Ok(outcome) => {
                // The registry has committed; broadcasting happens
                // strictly after the fact, outside any room lock.
                self.fanout.deliver(outcome).await;
            }
            Err(rejection) => {
                info!("rejected command from {}: {}", actor, rejection);
                self.fanout
                    .notify_actor(
                        actor,
                        OutboundPayload {
                            field: "error".to_string(),
                            script: rejection.to_string(),
                            identity: None,
                            state: None,
                        },
                    )
                    .await;
            }
        }
        Ok(())
    }

    /// Disconnect cleanup delivered by the transport. Idempotent with an
    /// ordinary leave; safe to call for actors that never joined a room.
    pub async fn handle_disconnect(&self, actor: PlayerId) {
        let outcome = self.dispatcher.disconnect(actor);
        self.fanout.deliver(outcome).await;
    }

    /// Access to the shared registry (reclamation sweep, tests).
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        self.dispatcher.registry()
    }

    /// Access to the fanout (reclamation sweep notifications).
    pub fn fanout(&self) -> &Fanout {
        &self.fanout
    }
}
