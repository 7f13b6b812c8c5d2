//! Client connection representation.
//!
//! Tracks the metadata of an individual connected client. The player id
//! itself is the key in the connection manager's maps, so this record
//! only carries what the id does not.

use std::net::SocketAddr;
use std::time::SystemTime;

/// Metadata for a single connected client.
#[derive(Debug, Clone)]
pub struct ClientConnection {
    /// The remote network address of the client.
    pub remote_addr: SocketAddr,

    /// When this connection was established.
    pub connected_at: SystemTime,
}

impl ClientConnection {
    /// Creates a connection record for the given remote address.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            connected_at: SystemTime::now(),
        }
    }
}
