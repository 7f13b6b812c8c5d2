//! Wire message types and routing between the transport and the core
//! engine.

pub mod router;
pub mod types;

pub use router::MessageRouter;
pub use types::{InboundMessage, OutboundMessage};
