//! # Arena Server
//!
//! WebSocket front end for the arena room engine. Accepts client
//! connections, parses JSON command frames, drives the shared room
//! registry in `arena_core`, and pushes the resulting notifications back
//! to the affected players.
//!
//! ## Components
//!
//! * **Connection Management** - WebSocket handshake, per-connection
//!   player ids, socket lifetime and cleanup
//! * **Messaging** - wire message types and the router between the
//!   transport and the core dispatcher
//! * **Server Core** - listener, accept loop, capacity enforcement, and
//!   the background room reclamation sweep
//! * **Configuration** - CLI arguments plus a TOML configuration file
//!   with generated defaults

pub mod config;
pub mod connection;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod server;
pub mod shutdown;

pub use config::{load_config, Args, Config};
pub use connection::{ArenaChannelSender, ConnectionManager};
pub use error::ServerError;
pub use messaging::{InboundMessage, MessageRouter, OutboundMessage};
pub use server::{ArenaServer, ServerConfig};
