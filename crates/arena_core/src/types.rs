//! # Core Type Definitions
//!
//! Fundamental types shared by the registry, dispatcher, and fanout:
//! player identifiers, caller-supplied identity/state payloads, and the
//! room container itself.
//!
//! ## Design Principles
//!
//! - **Type Safety**: `PlayerId` wraps a UUID so actor ids cannot be
//!   confused with room names or other strings.
//! - **Caller-supplied identity**: `PlayerIdentity` and `PlayerState` are
//!   provided by the transport layer and never re-derived internally.
//! - **Registry as truth**: the `room` field a client declares in its
//!   `PlayerState` is display data only; state-changing commands always
//!   consult the registry instead.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of participants in a battle room.
pub const MAX_PLAYERS: usize = 2;

/// Unique identifier for a connected participant.
///
/// This is the transport-level connection identifier: it changes across
/// reconnects and is distinct from the player's persistent identity.
///
/// # Examples
///
/// ```rust
/// use arena_core::PlayerId;
///
/// let actor = PlayerId::new();
/// println!("actor: {}", actor);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    /// Creates a new random actor ID using UUID v4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an actor ID from its string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - A string slice containing a valid UUID
    ///
    /// # Returns
    ///
    /// `Ok(PlayerId)` if the string is a valid UUID, otherwise the
    /// underlying `uuid::Error`.
    pub fn from_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::str::FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str(s)
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable user-facing identity supplied by the caller.
///
/// The core treats this as opaque display data. It is echoed back in
/// notifications so clients can render who did what, but it never
/// participates in registry decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerIdentity {
    /// Display name shown in room broadcasts.
    pub name: String,
    /// Optional honorific or title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Character level, used for flavor text only.
    #[serde(default)]
    pub level: u32,
}

impl PlayerIdentity {
    /// Creates an identity with just a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            level: 1,
        }
    }
}

/// Caller-declared gameplay snapshot.
///
/// The `room` field is what the *client* believes its current room is.
/// State-changing commands ignore it and consult the registry, which
/// prevents a stale or forged payload from driving an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Current hit points.
    pub hp: i64,
    /// Current mana points.
    pub mp: i64,
    /// The room the client believes it occupies, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            hp: 100,
            mp: 100,
            room: None,
        }
    }
}

/// Lifecycle states of a battle room.
///
/// The state machine only moves forward: Forming → Ready → Battling →
/// Closed, with early exits to Closed when members drain away. There is
/// no path out of Closed; a closed room is deleted from the registry and
/// its name becomes reusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Waiting for a second participant.
    Forming,
    /// At capacity; waiting for a member to issue `start`.
    Ready,
    /// Battle in progress.
    Battling,
    /// Terminal state; the room is being removed.
    Closed,
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoomState::Forming => "forming",
            RoomState::Ready => "ready",
            RoomState::Battling => "battling",
            RoomState::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// A participant inside a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Transport-level actor id of this participant.
    pub id: PlayerId,
    /// The identity the participant presented when joining.
    pub identity: PlayerIdentity,
}

/// Read-only view of a room, safe to hold after the registry guard is
/// released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Unique room name.
    pub name: String,
    /// Lifecycle state at snapshot time.
    pub state: RoomState,
    /// Members in join order.
    pub members: Vec<Member>,
}

/// Enumeration of possible disconnection reasons.
///
/// Structured information about why a participant's socket went away,
/// reported by the transport for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Client closed the connection or simply went away.
    ClientDisconnect,
    /// A transport error forced the disconnection.
    Error(String),
}
