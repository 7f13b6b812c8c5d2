//! Server-side error types.
//!
//! These cover transport and process-level failures only; game-level
//! rejections live in `arena_core` and are converted into caller-facing
//! notices before they ever reach this layer.

use thiserror::Error;

/// Errors raised by the transport and server plumbing.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Connection, binding, or protocol failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed inbound frame.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Anything else that should not abort the process.
    #[error("Internal error: {0}")]
    Internal(String),
}
