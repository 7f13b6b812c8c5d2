//! Authoritative in-memory room registry.
//!
//! The registry owns the exclusive mapping from room name to [`Room`] and
//! is the single source of truth for membership. All mutation happens
//! under the per-key entry guard of a [`DashMap`], so two concurrent
//! create/join/leave calls on the same name serialize while operations on
//! different names proceed in parallel. Critical sections are short and
//! synchronous: membership mutation plus a state check, never network
//! I/O, and never an `.await`.
//!
//! A player's "current room" back-reference lives in a derived reverse
//! index. It is reconciled inside the same critical section as the
//! membership change it mirrors, so the two views can never disagree.

use crate::error::RoomError;
use crate::room::{ReleaseOutcome, Room};
use crate::types::{Member, PlayerId, RoomSnapshot, RoomState};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tracing::debug;

/// Result of a leave operation, reported so the caller can notify the
/// right set of participants after the mutation has committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaveOutcome {
    /// The actor was not in the room; nothing changed.
    NotAMember,
    /// The actor left and the room stays open for the remaining members.
    Left {
        /// Name of the room that was left.
        room: String,
        /// Members still in the room, in join order.
        remaining: Vec<PlayerId>,
    },
    /// The leave drove the room to Closed; its entry has been deleted
    /// and the name is reusable.
    Closed {
        /// Name of the room that closed.
        room: String,
        /// Members evicted by the close (excluding the leaver).
        evicted: Vec<PlayerId>,
    },
}

/// Authoritative store of all active rooms, keyed by room name.
///
/// Cheap to share: wrap in an `Arc` and clone the handle across tasks.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Active rooms. The entry guard is the per-room lock.
    rooms: DashMap<String, Room>,
    /// Derived actor → room-name index backing `current_room_of`.
    /// Reconciled under the owning room's entry guard, never mutated
    /// independently.
    memberships: DashMap<PlayerId, String>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically creates a Forming room containing its first member.
    ///
    /// Exactly one of any set of concurrent creators of the same name
    /// wins; the rest receive `RoomExists`. A leftover Closed entry (a
    /// room mid-removal) does not block creation: names are reusable the
    /// moment a room closes.
    ///
    /// # Errors
    ///
    /// `RoomExists` if a non-Closed room with this name is registered.
    pub fn create(&self, name: &str, member: Member) -> Result<(), RoomError> {
        let actor = member.id;
        // The index write happens while the entry guard is still held:
        // a sweep cannot interleave between the room appearing and its
        // back-reference, so the two views never disagree.
        match self.rooms.entry(name.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().state() != RoomState::Closed {
                    return Err(RoomError::RoomExists(name.to_string()));
                }
                occupied.insert(Room::new(name, member));
                self.memberships.insert(actor, name.to_string());
            }
            Entry::Vacant(vacant) => {
                let _room = vacant.insert(Room::new(name, member));
                self.memberships.insert(actor, name.to_string());
            }
        }
        debug!("room '{}' created by {}", name, actor);
        Ok(())
    }

    /// Adds a member to an existing room.
    ///
    /// When the join reaches capacity the Forming → Ready transition is
    /// part of the same atomic step: no observer can see a full room
    /// whose state is stale.
    ///
    /// # Returns
    ///
    /// The room state after the join.
    ///
    /// # Errors
    ///
    /// `RoomNotFound` if no such room, `RoomFull` at capacity,
    /// `RoomClosed` when the room is not accepting members.
    pub fn join(&self, name: &str, member: Member) -> Result<RoomState, RoomError> {
        let actor = member.id;
        let mut room = self
            .rooms
            .get_mut(name)
            .ok_or_else(|| RoomError::RoomNotFound(name.to_string()))?;
        room.admit(member)?;
        let state = room.state();
        self.memberships.insert(actor, name.to_string());
        debug!("{} joined room '{}' (now {})", actor, name, state);
        Ok(state)
    }

    /// Attempts the Ready → Battling transition on behalf of a member.
    ///
    /// # Errors
    ///
    /// `RoomNotFound` if no such room; `InvalidTransition` when the state
    /// machine guard rejects the attempt (wrong state, short-handed room,
    /// or non-member caller). A rejected start has no side effect.
    pub fn start(&self, name: &str, actor: PlayerId) -> Result<(), RoomError> {
        let mut room = self
            .rooms
            .get_mut(name)
            .ok_or_else(|| RoomError::RoomNotFound(name.to_string()))?;
        room.begin_battle(actor)?;
        debug!("room '{}' entered battle", name);
        Ok(())
    }

    /// Removes a member from a room, deleting the entry when the room
    /// closes. Removing an actor who is not a member is a no-op, which
    /// makes duplicate leaves and late disconnect cleanup harmless.
    ///
    /// # Errors
    ///
    /// `RoomNotFound` if no such room.
    pub fn leave(&self, name: &str, actor: PlayerId) -> Result<LeaveOutcome, RoomError> {
        let Entry::Occupied(mut occupied) = self.rooms.entry(name.to_string()) else {
            return Err(RoomError::RoomNotFound(name.to_string()));
        };

        match occupied.get_mut().release(actor) {
            ReleaseOutcome::NotAMember => Ok(LeaveOutcome::NotAMember),
            ReleaseOutcome::Removed => {
                let remaining = occupied
                    .get()
                    .members()
                    .iter()
                    .map(|m| m.id)
                    .collect();
                self.memberships.remove(&actor);
                debug!("{} left room '{}'", actor, name);
                Ok(LeaveOutcome::Left {
                    room: name.to_string(),
                    remaining,
                })
            }
            ReleaseOutcome::Closed { evicted } => {
                // Remove the entry while still holding its guard so no
                // command can observe the Closed zombie.
                occupied.remove();
                self.memberships.remove(&actor);
                for id in &evicted {
                    self.memberships.remove(id);
                }
                debug!("room '{}' closed and removed", name);
                Ok(LeaveOutcome::Closed {
                    room: name.to_string(),
                    evicted,
                })
            }
        }
    }

    /// Disconnect path: resolves the actor's current room from the
    /// derived index and leaves it. An actor with no current room is a
    /// no-op, so the transport can fire this unconditionally on every
    /// socket close.
    pub fn leave_current(&self, actor: PlayerId) -> LeaveOutcome {
        let Some(name) = self.current_room_of(actor) else {
            return LeaveOutcome::NotAMember;
        };
        match self.leave(&name, actor) {
            // The index pointed at a room the actor is not in (the room
            // vanished, or its name was reused). Drop the stale entry so
            // the actor is not stuck "in" a room forever.
            Ok(LeaveOutcome::NotAMember) | Err(_) => {
                self.memberships.remove(&actor);
                LeaveOutcome::NotAMember
            }
            Ok(outcome) => outcome,
        }
    }

    /// Read-only snapshot of a room.
    ///
    /// # Errors
    ///
    /// `RoomNotFound` if no such room.
    pub fn lookup(&self, name: &str) -> Result<RoomSnapshot, RoomError> {
        self.rooms
            .get(name)
            .map(|room| room.snapshot())
            .ok_or_else(|| RoomError::RoomNotFound(name.to_string()))
    }

    /// The room's membership at this instant, in join order. This is what
    /// fanout consults at delivery time; an empty vector means the room
    /// is gone or empty.
    pub fn members_of(&self, name: &str) -> Vec<PlayerId> {
        self.rooms
            .get(name)
            .map(|room| room.members().iter().map(|m| m.id).collect())
            .unwrap_or_default()
    }

    /// The room the actor currently occupies, derived from membership.
    pub fn current_room_of(&self, actor: PlayerId) -> Option<String> {
        self.memberships.get(&actor).map(|entry| entry.clone())
    }

    /// Forcibly closes every room older than `max_age`, returning the
    /// (name, evicted members) pairs so callers can notify participants.
    /// Reclamation policy (sweep cadence, threshold) is external; this is
    /// only the mechanism.
    pub fn reclaim_stale(&self, max_age: Duration) -> Vec<(String, Vec<PlayerId>)> {
        let stale: Vec<String> = self
            .rooms
            .iter()
            .filter(|entry| entry.value().age() > max_age)
            .map(|entry| entry.key().clone())
            .collect();

        let mut reclaimed = Vec::new();
        for name in stale {
            let Entry::Occupied(mut occupied) = self.rooms.entry(name.clone()) else {
                continue;
            };
            // Re-check under the guard: the room may have been replaced
            // by a fresh one with the same name since the scan.
            if occupied.get().age() <= max_age {
                continue;
            }
            let evicted = occupied.get_mut().close();
            occupied.remove();
            for id in &evicted {
                self.memberships.remove(id);
            }
            debug!("room '{}' reclaimed as stale", name);
            reclaimed.push((name, evicted));
        }
        reclaimed
    }

    /// Number of active rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
