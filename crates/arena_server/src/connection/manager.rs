//! Connection management system
//!
//! Handles WebSocket connections, player sessions, and message routing.
//! Each accepted socket is assigned a fresh [`PlayerId`] which identifies
//! the connection everywhere else in the server; the id is never reused
//! after disconnect.

use crate::connection::client::ClientConnection;
use crate::error::ServerError;
use crate::messaging::MessageRouter;
use arena_core::{DisconnectReason, PlayerId};
use dashmap::DashMap;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use tracing::{error, info, warn};

/// Type alias for WebSocket stream
type WsStream = WebSocketStream<TcpStream>;
/// Type alias for WebSocket sink (outgoing messages)
pub type WsSink = SplitSink<WsStream, Message>;
/// Type alias for WebSocket receiver (incoming messages)
type WsReceiver = SplitStream<WsStream>;

/// Manages WebSocket connections and player sessions
///
/// The ConnectionManager handles:
/// - WebSocket handshake and connection establishment
/// - Message routing between clients and the message router
/// - Connection cleanup on disconnect, including room membership
pub struct ConnectionManager {
    /// Active WebSocket sinks mapped by player ID
    sinks: Arc<DashMap<PlayerId, WsSink>>,
    /// Connection metadata mapped by player ID
    clients: Arc<DashMap<PlayerId, ClientConnection>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    pub fn new() -> Self {
        Self {
            sinks: Arc::new(DashMap::new()),
            clients: Arc::new(DashMap::new()),
        }
    }

    /// Handle a new incoming TCP connection
    ///
    /// This method:
    /// 1. Performs the WebSocket handshake
    /// 2. Assigns a fresh player ID to the connection
    /// 3. Splits the connection for bidirectional communication
    /// 4. Spawns a task to handle incoming messages
    ///
    /// # Arguments
    /// * `stream` - TCP stream from the client
    /// * `addr` - Client's socket address
    /// * `router` - Router for processing incoming messages
    pub async fn handle_new_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        router: Arc<MessageRouter>,
    ) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("WebSocket handshake failed for {}: {}", addr, e);
                return;
            }
        };

        let (ws_sink, ws_receiver) = ws_stream.split();
        let actor = PlayerId::new();

        self.sinks.insert(actor, ws_sink);
        self.clients.insert(actor, ClientConnection::new(addr));
        info!("Connection {} established from {}", actor, addr);

        let sinks = self.sinks.clone();
        let clients = self.clients.clone();
        tokio::spawn(async move {
            let reason =
                Self::handle_connection_messages(actor, ws_receiver, router.clone(), sinks.clone())
                    .await;

            // Drop the socket first so nothing can be delivered to it,
            // then let the router walk the actor out of any room.
            sinks.remove(&actor);
            clients.remove(&actor);
            router.handle_disconnect(actor).await;
            info!("Connection {} from {} closed ({:?})", actor, addr, reason);
        });
    }

    /// Handle incoming messages from a specific connection
    ///
    /// Runs until the socket closes and reports why it did.
    ///
    /// # Arguments
    /// * `actor` - Player ID of this connection
    /// * `ws_receiver` - WebSocket receiver stream
    /// * `router` - Router for processing messages
    /// * `sinks` - Shared sink map for sending error responses
    async fn handle_connection_messages(
        actor: PlayerId,
        mut ws_receiver: WsReceiver,
        router: Arc<MessageRouter>,
        sinks: Arc<DashMap<PlayerId, WsSink>>,
    ) -> DisconnectReason {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Err(e) = router.route_message(text.as_str(), actor).await {
                        error!("Error handling message from {}: {}", actor, e);
                        Self::send_error_response(&sinks, actor, &e.to_string()).await;
                    }
                }
                Ok(Message::Close(_)) => {
                    info!("Connection {} requested close", actor);
                    return DisconnectReason::ClientDisconnect;
                }
                Ok(Message::Ping(data)) => {
                    // Respond to ping with pong
                    if let Some(mut sink) = sinks.get_mut(&actor) {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                }
                Ok(Message::Pong(_)) => {
                    // Pong received, connection is alive
                }
                Err(e) => {
                    error!("WebSocket error for connection {}: {}", actor, e);
                    return DisconnectReason::Error(e.to_string());
                }
                _ => {
                    warn!("Received unsupported message type from {}", actor);
                }
            }
        }
        // Stream exhausted without a close frame: the peer went away.
        DisconnectReason::ClientDisconnect
    }

    /// Send an error response to a specific connection
    ///
    /// # Arguments
    /// * `sinks` - Shared sink map
    /// * `actor` - Target connection
    /// * `error_message` - Error message to send
    async fn send_error_response(
        sinks: &DashMap<PlayerId, WsSink>,
        actor: PlayerId,
        error_message: &str,
    ) {
        let error_response = serde_json::json!({
            "field": "error",
            "script": error_message
        });

        if let Ok(response_text) = serde_json::to_string(&error_response) {
            if let Some(mut sink) = sinks.get_mut(&actor) {
                let _ = sink.send(Message::Text(response_text.into())).await;
            }
        }
    }

    /// Send a text frame to a specific connection
    ///
    /// # Arguments
    /// * `actor` - Target connection ID
    /// * `text` - Frame text to send
    ///
    /// # Errors
    /// `ServerError::Network` when the connection is gone or the socket
    /// write fails.
    pub async fn send_to_connection(&self, actor: PlayerId, text: &str) -> Result<(), ServerError> {
        let Some(mut sink) = self.sinks.get_mut(&actor) else {
            return Err(ServerError::Network(format!(
                "Connection {actor} not found"
            )));
        };
        sink.send(Message::Text(text.to_string().into()))
            .await
            .map_err(|e| ServerError::Network(format!("Failed to send message: {e}")))
    }

    /// Get the number of active connections
    pub fn connection_count(&self) -> usize {
        self.sinks.len()
    }

    /// Look up the metadata of an active connection
    pub fn client_info(&self, actor: PlayerId) -> Option<ClientConnection> {
        self.clients.get(&actor).map(|entry| entry.value().clone())
    }

    /// Close all connections gracefully
    pub async fn shutdown_all(&self) {
        for mut entry in self.sinks.iter_mut() {
            let _ = entry.value_mut().send(Message::Close(None)).await;
        }
        self.sinks.clear();
        self.clients.clear();
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_to_absent_connection_is_network_error() {
        let manager = ConnectionManager::new();
        let err = manager
            .send_to_connection(PlayerId::new(), "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Network(_)));
    }

    #[test]
    fn test_new_manager_has_no_connections() {
        let manager = ConnectionManager::new();
        assert_eq!(manager.connection_count(), 0);
        assert!(manager.client_info(PlayerId::new()).is_none());
    }
}
