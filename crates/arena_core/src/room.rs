//! Per-room session state machine.
//!
//! A [`Room`] owns its membership list and lifecycle state and exposes
//! *transition attempts* only — there is no way to assign a state
//! directly, so illegal jumps are structurally impossible. The registry
//! calls these methods while holding the per-room guard, which makes each
//! transition atomic with respect to concurrent commands on the same
//! room.
//!
//! Transitions:
//!
//! | From          | Event                          | To       |
//! |---------------|--------------------------------|----------|
//! | Forming       | join reaches capacity          | Ready    |
//! | Ready         | `start` by a current member    | Battling |
//! | Battling      | member leaves or disconnects   | Closed   |
//! | Forming/Ready | all members leave              | Closed   |
//!
//! There is no path back from Closed.

use crate::error::RoomError;
use crate::types::{Member, PlayerId, RoomSnapshot, RoomState, MAX_PLAYERS};
use std::time::Instant;

/// A bounded-capacity session container for exactly [`MAX_PLAYERS`]
/// participants progressing through a shared state machine.
#[derive(Debug)]
pub struct Room {
    name: String,
    state: RoomState,
    members: Vec<Member>,
    created_at: Instant,
}

/// Result of removing a member from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The actor was not a member; nothing changed. Duplicate leaves and
    /// late disconnect cleanup land here.
    NotAMember,
    /// The member was removed and the room stays open.
    Removed,
    /// The member was removed and the room transitioned to Closed. The
    /// registry must delete the entry; the remaining members (if any)
    /// were evicted and are reported here so their reverse-index entries
    /// can be reconciled.
    Closed {
        /// Members evicted by the close, in join order.
        evicted: Vec<PlayerId>,
    },
}

impl Room {
    /// Creates a Forming room containing its first member.
    pub fn new(name: impl Into<String>, first: Member) -> Self {
        Self {
            name: name.into(),
            state: RoomState::Forming,
            members: vec![first],
            created_at: Instant::now(),
        }
    }

    /// The room's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoomState {
        self.state
    }

    /// Members in join order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// How long ago the room was created, for stale-room reclamation.
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Whether the given actor is currently a member.
    pub fn contains(&self, actor: PlayerId) -> bool {
        self.members.iter().any(|m| m.id == actor)
    }

    /// Attempts to admit a new member.
    ///
    /// When the join fills the room, the Forming → Ready transition
    /// happens inside this call: no observer can ever see a full room
    /// that is still Forming.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if this join reached capacity (room is now Ready),
    /// `Ok(false)` if there is still space, `RoomClosed` when the room is
    /// not in a joinable state (Battling or Closed), `RoomFull` when a
    /// joinable room is at capacity.
    pub fn admit(&mut self, member: Member) -> Result<bool, RoomError> {
        match self.state {
            // A Ready room can be short a member (someone left before the
            // battle started); it accepts a replacement without moving
            // backward to Forming.
            RoomState::Forming | RoomState::Ready => {}
            // The state check comes first: a battle in progress reads as
            // "closed", not "full", even though Battling implies full.
            RoomState::Battling | RoomState::Closed => {
                return Err(RoomError::RoomClosed(self.name.clone()));
            }
        }
        if self.members.len() >= MAX_PLAYERS {
            return Err(RoomError::RoomFull(self.name.clone()));
        }

        self.members.push(member);
        if self.members.len() == MAX_PLAYERS {
            self.state = RoomState::Ready;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Attempts the Ready → Battling transition.
    ///
    /// Guard: the room must be Ready *and full* and the caller must be a
    /// current member. The fullness check keeps the Battling ⇒ full
    /// invariant when a member left a Ready room just before the start.
    /// Any rejected attempt has no side effect.
    pub fn begin_battle(&mut self, actor: PlayerId) -> Result<(), RoomError> {
        if self.state != RoomState::Ready
            || self.members.len() != MAX_PLAYERS
            || !self.contains(actor)
        {
            return Err(RoomError::InvalidTransition {
                room: self.name.clone(),
                from: self.state,
            });
        }
        self.state = RoomState::Battling;
        Ok(())
    }

    /// Removes a member, driving the state machine forward as needed.
    ///
    /// Membership loss never moves the state backward: draining the last
    /// member closes the room, and a Battling room closes as soon as it
    /// loses anyone (a battle cannot continue short-handed). Removing an
    /// actor who is not a member is a no-op, which makes disconnect
    /// cleanup idempotent with an ordinary leave.
    pub fn release(&mut self, actor: PlayerId) -> ReleaseOutcome {
        let Some(pos) = self.members.iter().position(|m| m.id == actor) else {
            return ReleaseOutcome::NotAMember;
        };
        self.members.remove(pos);

        let must_close = self.members.is_empty() || self.state == RoomState::Battling;
        if must_close {
            self.state = RoomState::Closed;
            let evicted = self.members.drain(..).map(|m| m.id).collect();
            ReleaseOutcome::Closed { evicted }
        } else {
            ReleaseOutcome::Removed
        }
    }

    /// Forces the room to Closed, evicting all members. Used by the
    /// stale-room reclamation sweep.
    pub fn close(&mut self) -> Vec<PlayerId> {
        self.state = RoomState::Closed;
        self.members.drain(..).map(|m| m.id).collect()
    }

    /// Produces an owned read-only view of the room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            name: self.name.clone(),
            state: self.state,
            members: self.members.clone(),
        }
    }
}
