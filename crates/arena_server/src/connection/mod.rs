//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! connection tracking, player ID assignment, and delivery of outbound
//! notifications.

pub mod client;
pub mod manager;
pub mod response;

pub use client::ClientConnection;
pub use manager::ConnectionManager;
pub use response::ArenaChannelSender;
