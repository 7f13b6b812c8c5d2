//! Typed errors for the registry and dispatcher.
//!
//! All of these are recovered at the dispatcher boundary and converted
//! into caller-directed notifications or structured rejections; none of
//! them should ever abort the process. Unknown command tokens are
//! deliberately *not* an error — they take a soft-fail path that answers
//! only the caller.

use crate::types::RoomState;
use thiserror::Error;

/// Errors produced by room registry operations and state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// A non-closed room with this name already exists.
    #[error("room '{0}' already exists")]
    RoomExists(String),

    /// No room with this name is registered.
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    /// The room is already at capacity.
    #[error("room '{0}' is full")]
    RoomFull(String),

    /// The room is not accepting members (closing or closed).
    #[error("room '{0}' is closed")]
    RoomClosed(String),

    /// A state machine guard rejected the transition.
    #[error("invalid transition for room '{room}' in state {from}")]
    InvalidTransition {
        /// Name of the room the transition targeted.
        room: String,
        /// State the room was in when the attempt was rejected.
        from: RoomState,
    },
}

/// Errors surfaced by the command dispatcher before any state mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A required request field (identity or state payload) was absent.
    /// Caller-facing and non-fatal; maps to a client error status at the
    /// transport boundary.
    #[error("{0} missing")]
    MissingField(&'static str),

    /// A registry or state machine rejection.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RoomError::RoomExists("pvp-room a1".to_string());
        assert_eq!(err.to_string(), "room 'pvp-room a1' already exists");

        let err = RoomError::InvalidTransition {
            room: "pvp-room a1".to_string(),
            from: RoomState::Forming,
        };
        assert!(err.to_string().contains("forming"));
    }

    #[test]
    fn test_room_error_converts_to_dispatch_error() {
        let err: DispatchError = RoomError::RoomFull("x".to_string()).into();
        assert!(matches!(
            err,
            DispatchError::Room(RoomError::RoomFull(_))
        ));
    }

    #[test]
    fn test_missing_field_display() {
        assert_eq!(
            DispatchError::MissingField("userInfo").to_string(),
            "userInfo missing"
        );
    }
}
