//! # Arena Core - Room Lifecycle and Command Dispatch Engine
//!
//! The engine behind short-lived, two-participant battle sessions:
//! players issue text-like commands that create or join a named room,
//! advance a small state machine, and receive broadcast notifications
//! describing the session's evolving state.
//!
//! ## Architecture Overview
//!
//! * **Room Registry** - authoritative store of all active rooms, keyed
//!   by name; owns creation, capacity checks, and membership mutation
//!   under a per-room lock.
//! * **Session State Machine** - per-room transitions
//!   (forming → ready → battling → closed) exposed only as guarded
//!   attempts, never direct assignment.
//! * **Command Dispatcher** - validates inbound commands against
//!   registry truth and produces the notifications a committed
//!   transition owes.
//! * **Broadcast Fanout** - fire-and-forget delivery to one actor or to
//!   every current member of a room, always computed from present
//!   membership.
//! * **Script Catalog** - opaque lookup from (command, context) to
//!   display text.
//!
//! ## Control Flow
//!
//! 1. The transport hands the dispatcher an `(actor, command, payload)`
//!    triple.
//! 2. The dispatcher validates it against the registry and, on success,
//!    mutates room state atomically under the per-room lock.
//! 3. Only after the mutation has committed does the fanout deliver the
//!    resulting notifications — a participant can never observe a
//!    broadcast describing a state the registry has not applied.
//!
//! ## Concurrency
//!
//! There is no global lock. Per-room mutual exclusion serializes
//! create/join/leave/start against the same room name; unrelated rooms
//! proceed fully in parallel. Critical sections are short and
//! synchronous — broadcast delivery always happens after the room guard
//! is released.
//!
//! ## Error Handling
//!
//! Library errors are structured ([`RoomError`], [`DispatchError`]) and
//! recovered at the dispatcher boundary; unknown commands are a
//! soft-fail path that answers only the caller.

pub use dispatch::{Command, CommandRequest, Dispatcher, Notice, Outcome, Scope};
pub use error::{DispatchError, RoomError};
pub use fanout::{ChannelSender, Fanout, OutboundPayload};
pub use registry::{LeaveOutcome, RoomRegistry};
pub use room::{ReleaseOutcome, Room};
pub use script::ScriptCatalog;
pub use types::{
    DisconnectReason, Member, PlayerId, PlayerIdentity, PlayerState, RoomSnapshot, RoomState,
    MAX_PLAYERS,
};

pub mod dispatch;
pub mod error;
pub mod fanout;
pub mod registry;
pub mod room;
pub mod script;
pub mod types;
