//! Core server implementation.
//!
//! This module contains the main `ArenaServer` struct and its
//! implementation, providing the central orchestration of all server
//! components: the room registry, command routing, connection
//! management, and the background reclamation sweep for abandoned rooms.

use crate::{
    config::Config,
    connection::{ArenaChannelSender, ConnectionManager},
    error::ServerError,
    messaging::MessageRouter,
};
use arena_core::{OutboundPayload, RoomRegistry, ScriptCatalog};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};

/// Runtime configuration for the arena server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The socket address to bind the WebSocket listener to.
    pub bind_address: SocketAddr,

    /// Maximum number of simultaneously connected clients.
    pub max_connections: usize,

    /// How often the reclamation sweep runs. Zero disables the sweep.
    pub reclaim_interval: Duration,

    /// Age past which a room is considered abandoned and reclaimed.
    pub room_max_age: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".parse().unwrap(),
            max_connections: 1000,
            reclaim_interval: Duration::from_secs(60),
            room_max_age: Duration::from_secs(1800),
        }
    }
}

impl ServerConfig {
    /// Builds the runtime configuration from a loaded config file.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Internal` when the configured listen address
    /// does not parse as a socket address.
    pub fn from_config(config: &Config) -> Result<Self, ServerError> {
        let bind_address = config.server.listen_addr.parse().map_err(|e| {
            ServerError::Internal(format!(
                "Invalid listen address '{}': {}",
                config.server.listen_addr, e
            ))
        })?;
        Ok(Self {
            bind_address,
            max_connections: config.server.max_connections,
            reclaim_interval: Duration::from_secs(config.rooms.reclaim_interval_secs),
            room_max_age: Duration::from_secs(config.rooms.max_age_secs),
        })
    }
}

/// The core arena server structure.
///
/// `ArenaServer` wires the shared room registry into the command router
/// and the WebSocket connection manager, and owns the background tasks
/// that keep the registry healthy.
///
/// # Architecture
///
/// * **Room Registry**: Shared, lock-sharded room and membership state
/// * **Message Router**: Parses frames and drives the command dispatcher
/// * **Connection Management**: WebSocket lifecycle and player mapping
/// * **Reclamation Sweep**: Periodic cleanup of abandoned rooms
pub struct ArenaServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Shared room and membership state
    registry: Arc<RoomRegistry>,

    /// Routes inbound frames to the dispatcher and outcomes back out
    router: Arc<MessageRouter>,

    /// Manager for client connections and messaging
    connection_manager: Arc<ConnectionManager>,

    /// Channel for coordinating server shutdown
    shutdown_sender: broadcast::Sender<()>,
}

impl ArenaServer {
    /// Creates a new arena server with the specified configuration.
    ///
    /// Initializes all core components; the server is ready to start
    /// after construction.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let connection_manager = Arc::new(ConnectionManager::new());
        let (shutdown_sender, _) = broadcast::channel(1);

        // Outbound notifications flow back through the same connection
        // manager the inbound frames arrive on.
        let sender = Arc::new(ArenaChannelSender::new(connection_manager.clone()));
        let router = Arc::new(MessageRouter::new(registry.clone(), sender));

        Self {
            config,
            registry,
            router,
            connection_manager,
            shutdown_sender,
        }
    }

    /// Starts the server and begins accepting connections.
    ///
    /// Binds the listener, starts the reclamation sweep when configured,
    /// and runs the accept loop until a shutdown signal arrives.
    ///
    /// # Errors
    ///
    /// `ServerError::Network` when the bind fails.
    pub async fn start(&self) -> Result<(), ServerError> {
        info!("🚀 Starting arena server on {}", self.config.bind_address);

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!(
                    "Failed to bind to {}: {}",
                    self.config.bind_address, e
                ))
            })?;

        if self.config.reclaim_interval > Duration::ZERO {
            self.start_reclamation_sweep();
            info!(
                "🕒 Room reclamation sweep started (every {:?}, max age {:?})",
                self.config.reclaim_interval, self.config.room_max_age
            );
        } else {
            info!("⏸️ Room reclamation sweep disabled");
        }

        let mut shutdown_rx = self.shutdown_sender.subscribe();
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            if self.connection_manager.connection_count()
                                >= self.config.max_connections
                            {
                                warn!(
                                    "Refusing connection from {}: at capacity ({})",
                                    addr, self.config.max_connections
                                );
                                drop(stream);
                                continue;
                            }
                            self.connection_manager
                                .handle_new_connection(stream, addr, self.router.clone())
                                .await;
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping server");
                    break;
                }
            }
        }

        self.connection_manager.shutdown_all().await;
        Ok(())
    }

    /// Spawns the periodic sweep that closes abandoned rooms and walks
    /// their evicted members back to the village.
    fn start_reclamation_sweep(&self) {
        let registry = self.registry.clone();
        let router = self.router.clone();
        let max_age = self.config.room_max_age;
        let period = self.config.reclaim_interval;
        let mut shutdown_rx = self.shutdown_sender.subscribe();

        tokio::spawn(async move {
            let scripts = ScriptCatalog::new();
            let mut ticker = interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let reclaimed = registry.reclaim_stale(max_age);
                        for (room, evicted) in reclaimed {
                            info!("Reclaimed stale room '{}' ({} member(s))", room, evicted.len());
                            for actor in evicted {
                                router.fanout().notify_actor(actor, OutboundPayload {
                                    field: "village".to_string(),
                                    script: scripts.room_expired(),
                                    identity: None,
                                    state: None,
                                }).await;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => break,
                }
            }
        });
    }

    /// Initiates a graceful shutdown of the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_sender.send(());
    }

    /// The shared room registry.
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// The message router handling inbound frames.
    pub fn router(&self) -> &Arc<MessageRouter> {
        &self.router
    }

    /// Number of currently connected clients.
    pub fn connection_count(&self) -> usize {
        self.connection_manager.connection_count()
    }
}
