//! Command dispatcher: validates inbound commands against registry truth
//! and turns them into committed state transitions plus the notifications
//! those transitions owe.
//!
//! The dispatcher never trusts the caller-declared room or state for
//! state-changing commands — the registry is consulted instead, so a
//! stale or forged client payload cannot drive an invalid transition.
//! Unknown command tokens are a deliberate soft-fail UX path: they
//! produce a caller-only "wrong command" notice rather than an error.
//!
//! Every [`Outcome`] this module returns describes notifications for
//! state that has *already committed*; callers hand the outcome to the
//! fanout after the fact, which is what keeps broadcasts causally ordered
//! behind the transitions they describe.

use crate::error::{DispatchError, RoomError};
use crate::registry::{LeaveOutcome, RoomRegistry};
use crate::script::ScriptCatalog;
use crate::types::{Member, PlayerId, PlayerIdentity, PlayerState};
use std::sync::Arc;
use tracing::debug;

/// Closed set of command tokens the core understands.
///
/// New commands are added here and pattern-matched exhaustively, so a new
/// verb is a compile-time-checked addition rather than a dictionary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a new room named after the argument.
    Create,
    /// Enter an existing room named after the argument.
    Join,
    /// Begin the battle in the caller's current room.
    Start,
    /// Leave the current room and return to the village.
    Leave,
    /// List the fighters in the caller's current room.
    Who,
    /// Show help for a topic.
    Help,
    /// Explicit fallback arm for anything else.
    Unknown(String),
}

impl Command {
    /// Parses a wire-level command token.
    pub fn parse(token: &str) -> Self {
        match token {
            "create" => Command::Create,
            "join" => Command::Join,
            "start" => Command::Start,
            "leave" => Command::Leave,
            "who" => Command::Who,
            "help" => Command::Help,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// An inbound command as the core consumes it. Transport framing and
/// field naming are the server crate's concern.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Transport-level id of the acting connection.
    pub actor: PlayerId,
    /// Raw command token from the client.
    pub command: String,
    /// Command argument (room key, help topic), when present.
    pub argument: Option<String>,
    /// Caller-supplied identity; required for every command.
    pub identity: Option<PlayerIdentity>,
    /// Caller-declared state snapshot; required, but only echoed back.
    pub state: Option<PlayerState>,
}

/// Who a notice is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Exactly one connection.
    Actor(PlayerId),
    /// Every member of the named room at delivery time.
    Room(String),
}

/// A single outbound notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Delivery target.
    pub scope: Scope,
    /// UI routing hint for the client (which pane renders the text).
    pub field: &'static str,
    /// Display text resolved from the script catalog.
    pub script: String,
    /// Acting player's identity, echoed on individual confirmations.
    pub identity: Option<PlayerIdentity>,
    /// Updated state snapshot, echoed on individual confirmations.
    pub state: Option<PlayerState>,
}

impl Notice {
    fn to_actor(actor: PlayerId, field: &'static str, script: String) -> Self {
        Self {
            scope: Scope::Actor(actor),
            field,
            script,
            identity: None,
            state: None,
        }
    }

    fn to_room(room: &str, field: &'static str, script: String) -> Self {
        Self {
            scope: Scope::Room(room.to_string()),
            field,
            script,
            identity: None,
            state: None,
        }
    }

    fn with_echo(mut self, identity: PlayerIdentity, state: PlayerState) -> Self {
        self.identity = Some(identity);
        self.state = Some(state);
        self
    }
}

/// The committed result of a dispatched command: the notifications owed,
/// in the order they must be delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Notices in delivery order.
    pub notices: Vec<Notice>,
}

impl Outcome {
    fn of(notices: Vec<Notice>) -> Self {
        Self { notices }
    }
}

/// Validates inbound commands and drives the registry.
pub struct Dispatcher {
    registry: Arc<RoomRegistry>,
    scripts: ScriptCatalog,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared registry.
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self {
            registry,
            scripts: ScriptCatalog::new(),
        }
    }

    /// Access to the underlying registry, for transports that need
    /// membership reads (fanout, disconnect cleanup).
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Validates and executes one command.
    ///
    /// On `Ok`, every state change described by the outcome has already
    /// been applied to the registry. On `Err`, nothing was mutated and
    /// the rejection is meant for the caller's channel only.
    ///
    /// # Errors
    ///
    /// `MissingField` when the identity or state payload is absent;
    /// `Room(_)` for registry and state machine rejections.
    pub fn dispatch(&self, request: CommandRequest) -> Result<Outcome, DispatchError> {
        let identity = request
            .identity
            .ok_or(DispatchError::MissingField("userInfo"))?;
        let state = request
            .state
            .ok_or(DispatchError::MissingField("userStatus"))?;
        let actor = request.actor;
        let argument = request.argument.as_deref();

        let command = Command::parse(&request.command);
        debug!("dispatching {:?} from {}", command, actor);

        match command {
            Command::Create => self.handle_create(actor, argument, identity, state),
            Command::Join => self.handle_join(actor, argument, identity, state),
            Command::Start => self.handle_start(actor, state),
            Command::Leave => self.handle_leave(actor, identity, state),
            Command::Who => self.handle_who(actor),
            Command::Help => Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "help",
                self.scripts.help(argument.unwrap_or("")),
            )])),
            Command::Unknown(token) => Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "wrong_command",
                self.scripts.wrong_command(&token),
            )])),
        }
    }

    /// Derives the registry room name from a client-supplied room key.
    /// Deterministic, so the same key always addresses the same room.
    pub fn room_name(key: &str) -> String {
        format!("pvp-room {key}")
    }

    fn handle_create(
        &self,
        actor: PlayerId,
        argument: Option<&str>,
        identity: PlayerIdentity,
        state: PlayerState,
    ) -> Result<Outcome, DispatchError> {
        let Some(key) = argument.filter(|k| !k.is_empty()) else {
            // Creating without a room key is the original's wrongCommand
            // path: answer the caller, mutate nothing.
            return Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "wrong_command",
                self.scripts.wrong_command("create"),
            )]));
        };
        if let Some(current) = self.registry.current_room_of(actor) {
            return Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "wrong_command",
                self.scripts.already_in_room(&current),
            )]));
        }

        let name = Self::room_name(key);
        self.registry.create(
            &name,
            Member {
                id: actor,
                identity: identity.clone(),
            },
        )?;

        Ok(Outcome::of(self.entry_notices(actor, &name, identity, state)))
    }

    fn handle_join(
        &self,
        actor: PlayerId,
        argument: Option<&str>,
        identity: PlayerIdentity,
        state: PlayerState,
    ) -> Result<Outcome, DispatchError> {
        let Some(key) = argument.filter(|k| !k.is_empty()) else {
            return Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "wrong_command",
                self.scripts.wrong_command("join"),
            )]));
        };
        if let Some(current) = self.registry.current_room_of(actor) {
            return Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "wrong_command",
                self.scripts.already_in_room(&current),
            )]));
        }

        let name = Self::room_name(key);
        self.registry.join(
            &name,
            Member {
                id: actor,
                identity: identity.clone(),
            },
        )?;

        Ok(Outcome::of(self.entry_notices(actor, &name, identity, state)))
    }

    /// Individual join confirmation plus the room-wide joined broadcast,
    /// shared by create and join.
    fn entry_notices(
        &self,
        actor: PlayerId,
        room: &str,
        identity: PlayerIdentity,
        mut state: PlayerState,
    ) -> Vec<Notice> {
        state.room = Some(room.to_string());
        let script = self.scripts.room_join(&identity.name);
        vec![
            Notice::to_actor(actor, "pvp_join", script.clone()).with_echo(identity, state),
            Notice::to_room(room, "pvp_join", script),
        ]
    }

    fn handle_start(
        &self,
        actor: PlayerId,
        state: PlayerState,
    ) -> Result<Outcome, DispatchError> {
        // Registry truth, not the declared payload, decides which room
        // the start targets. The declared name only shapes the error for
        // a caller who is not in any room.
        let Some(room) = self.registry.current_room_of(actor) else {
            let declared = state.room.unwrap_or_else(|| "unknown".to_string());
            return Err(RoomError::RoomNotFound(declared).into());
        };
        self.registry.start(&room, actor)?;

        Ok(Outcome::of(vec![Notice::to_room(
            &room,
            "pvp_battle",
            self.scripts.battle_start(),
        )]))
    }

    fn handle_leave(
        &self,
        actor: PlayerId,
        identity: PlayerIdentity,
        mut state: PlayerState,
    ) -> Result<Outcome, DispatchError> {
        state.room = None;
        let village = Notice::to_actor(actor, "village", self.scripts.village())
            .with_echo(identity, state);

        match self.registry.leave_current(actor) {
            // Leaving while not in a room is a no-op on the registry but
            // still walks the caller back to the village.
            LeaveOutcome::NotAMember => Ok(Outcome::of(vec![village])),
            LeaveOutcome::Left { room, .. } => Ok(Outcome::of(vec![
                village,
                Notice::to_room(&room, "pvp_join", self.scripts.opponent_left()),
            ])),
            LeaveOutcome::Closed { evicted, .. } => {
                // The room entry is already gone, so survivors are
                // addressed individually rather than via the room scope.
                let mut notices = vec![village];
                for survivor in evicted {
                    notices.push(Notice::to_actor(
                        survivor,
                        "village",
                        self.scripts.opponent_left(),
                    ));
                }
                Ok(Outcome::of(notices))
            }
        }
    }

    /// Disconnect cleanup: an asynchronous leave delivered by the
    /// transport. Idempotent — an actor who already left produces an
    /// empty outcome.
    pub fn disconnect(&self, actor: PlayerId) -> Outcome {
        match self.registry.leave_current(actor) {
            LeaveOutcome::NotAMember => Outcome::default(),
            LeaveOutcome::Left { room, .. } => Outcome::of(vec![Notice::to_room(
                &room,
                "pvp_join",
                self.scripts.opponent_left(),
            )]),
            LeaveOutcome::Closed { evicted, .. } => Outcome::of(
                evicted
                    .into_iter()
                    .map(|survivor| {
                        Notice::to_actor(survivor, "village", self.scripts.opponent_left())
                    })
                    .collect(),
            ),
        }
    }

    fn handle_who(&self, actor: PlayerId) -> Result<Outcome, DispatchError> {
        let Some(room) = self.registry.current_room_of(actor) else {
            return Ok(Outcome::of(vec![Notice::to_actor(
                actor,
                "pvp_join",
                self.scripts.not_in_room(),
            )]));
        };
        let snapshot = self.registry.lookup(&room)?;
        let mut lines = vec![self.scripts.roster_header()];
        for member in &snapshot.members {
            lines.push(format!("- {} (lv.{})", member.identity.name, member.identity.level));
        }
        Ok(Outcome::of(vec![Notice::to_actor(
            actor,
            "pvp_join",
            lines.join("\n"),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RoomState;

    fn request(actor: PlayerId, command: &str, argument: Option<&str>, name: &str) -> CommandRequest {
        CommandRequest {
            actor,
            command: command.to_string(),
            argument: argument.map(str::to_string),
            identity: Some(PlayerIdentity::named(name)),
            state: Some(PlayerState::default()),
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(RoomRegistry::new()))
    }

    #[test]
    fn test_missing_identity_rejected() {
        let dispatcher = dispatcher();
        let mut req = request(PlayerId::new(), "create", Some("a1"), "aria");
        req.identity = None;
        let err = dispatcher.dispatch(req).unwrap_err();
        assert_eq!(err, DispatchError::MissingField("userInfo"));
    }

    #[test]
    fn test_missing_state_rejected() {
        let dispatcher = dispatcher();
        let mut req = request(PlayerId::new(), "join", Some("a1"), "aria");
        req.state = None;
        let err = dispatcher.dispatch(req).unwrap_err();
        assert_eq!(err, DispatchError::MissingField("userStatus"));
    }

    #[test]
    fn test_unknown_command_soft_fails_to_caller_only() {
        let dispatcher = dispatcher();
        let actor = PlayerId::new();
        let outcome = dispatcher
            .dispatch(request(actor, "dance", None, "aria"))
            .unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].scope, Scope::Actor(actor));
        assert!(outcome.notices[0].script.contains("dance"));
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn test_create_emits_confirmation_and_room_broadcast() {
        let dispatcher = dispatcher();
        let actor = PlayerId::new();
        let outcome = dispatcher
            .dispatch(request(actor, "create", Some("a1"), "aria"))
            .unwrap();

        assert_eq!(outcome.notices.len(), 2);
        assert_eq!(outcome.notices[0].scope, Scope::Actor(actor));
        // The echoed state carries the registry-derived room name.
        let echoed = outcome.notices[0].state.as_ref().unwrap();
        assert_eq!(echoed.room.as_deref(), Some("pvp-room a1"));
        assert_eq!(
            outcome.notices[1].scope,
            Scope::Room("pvp-room a1".to_string())
        );

        let snapshot = dispatcher.registry().lookup("pvp-room a1").unwrap();
        assert_eq!(snapshot.state, RoomState::Forming);
    }

    #[test]
    fn test_create_without_key_is_wrong_command() {
        let dispatcher = dispatcher();
        let actor = PlayerId::new();
        let outcome = dispatcher
            .dispatch(request(actor, "create", None, "aria"))
            .unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].field, "wrong_command");
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn test_create_while_in_room_soft_fails() {
        let dispatcher = dispatcher();
        let actor = PlayerId::new();
        dispatcher
            .dispatch(request(actor, "create", Some("a1"), "aria"))
            .unwrap();
        let outcome = dispatcher
            .dispatch(request(actor, "create", Some("b2"), "aria"))
            .unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.notices[0].script.contains("pvp-room a1"));
        assert_eq!(dispatcher.registry().len(), 1);
    }

    #[test]
    fn test_duplicate_create_surfaces_room_exists() {
        let dispatcher = dispatcher();
        dispatcher
            .dispatch(request(PlayerId::new(), "create", Some("a1"), "aria"))
            .unwrap();
        let err = dispatcher
            .dispatch(request(PlayerId::new(), "create", Some("a1"), "bram"))
            .unwrap_err();
        assert!(matches!(err, DispatchError::Room(RoomError::RoomExists(_))));
    }

    #[test]
    fn test_start_uses_registry_truth_not_declared_room() {
        let dispatcher = dispatcher();
        let a = PlayerId::new();
        let b = PlayerId::new();
        dispatcher
            .dispatch(request(a, "create", Some("a1"), "aria"))
            .unwrap();
        dispatcher
            .dispatch(request(b, "join", Some("a1"), "bram"))
            .unwrap();

        // The caller declares a bogus room; the registry wins.
        let mut req = request(a, "start", None, "aria");
        req.state = Some(PlayerState {
            room: Some("pvp-room forged".to_string()),
            ..PlayerState::default()
        });
        let outcome = dispatcher.dispatch(req).unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(
            outcome.notices[0].scope,
            Scope::Room("pvp-room a1".to_string())
        );
        assert_eq!(
            dispatcher.registry().lookup("pvp-room a1").unwrap().state,
            RoomState::Battling
        );
    }

    #[test]
    fn test_start_before_ready_is_rejected_without_broadcast() {
        let dispatcher = dispatcher();
        let a = PlayerId::new();
        dispatcher
            .dispatch(request(a, "create", Some("a1"), "aria"))
            .unwrap();
        let err = dispatcher
            .dispatch(request(a, "start", None, "aria"))
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Room(RoomError::InvalidTransition { .. })
        ));
        assert_eq!(
            dispatcher.registry().lookup("pvp-room a1").unwrap().state,
            RoomState::Forming
        );
    }

    #[test]
    fn test_full_session_scenario() {
        // Spec walkthrough: create, join, start, disconnect, stale start.
        let dispatcher = dispatcher();
        let a = PlayerId::new();
        let b = PlayerId::new();

        dispatcher
            .dispatch(request(a, "create", Some("a1"), "aria"))
            .unwrap();
        let join = dispatcher
            .dispatch(request(b, "join", Some("a1"), "bram"))
            .unwrap();
        assert_eq!(join.notices.len(), 2);
        assert_eq!(
            dispatcher.registry().lookup("pvp-room a1").unwrap().state,
            RoomState::Ready
        );

        let start = dispatcher.dispatch(request(a, "start", None, "aria")).unwrap();
        assert_eq!(start.notices.len(), 1);
        assert_eq!(start.notices[0].field, "pvp_battle");

        // A disconnects mid-battle: room closes, survivor is told.
        let cleanup = dispatcher.disconnect(a);
        assert_eq!(cleanup.notices.len(), 1);
        assert_eq!(cleanup.notices[0].scope, Scope::Actor(b));
        assert!(dispatcher.registry().is_empty());

        // B's start on the vanished room now fails with RoomNotFound.
        let mut req = request(b, "start", None, "bram");
        req.state = Some(PlayerState {
            room: Some("pvp-room a1".to_string()),
            ..PlayerState::default()
        });
        let err = dispatcher.dispatch(req).unwrap_err();
        assert_eq!(
            err,
            DispatchError::Room(RoomError::RoomNotFound("pvp-room a1".to_string()))
        );
    }

    #[test]
    fn test_leave_walks_caller_to_village_and_informs_room() {
        let dispatcher = dispatcher();
        let a = PlayerId::new();
        let b = PlayerId::new();
        dispatcher
            .dispatch(request(a, "create", Some("a1"), "aria"))
            .unwrap();
        dispatcher
            .dispatch(request(b, "join", Some("a1"), "bram"))
            .unwrap();

        let outcome = dispatcher.dispatch(request(b, "leave", None, "bram")).unwrap();
        assert_eq!(outcome.notices[0].scope, Scope::Actor(b));
        assert_eq!(outcome.notices[0].field, "village");
        assert_eq!(outcome.notices[0].state.as_ref().unwrap().room, None);
        assert_eq!(
            outcome.notices[1].scope,
            Scope::Room("pvp-room a1".to_string())
        );

        // The room survived with one member.
        assert_eq!(dispatcher.registry().members_of("pvp-room a1").len(), 1);
    }

    #[test]
    fn test_leave_when_not_in_room_is_soft() {
        let dispatcher = dispatcher();
        let actor = PlayerId::new();
        let outcome = dispatcher
            .dispatch(request(actor, "leave", None, "aria"))
            .unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].field, "village");
    }

    #[test]
    fn test_disconnect_twice_is_noop() {
        let dispatcher = dispatcher();
        let a = PlayerId::new();
        dispatcher
            .dispatch(request(a, "create", Some("a1"), "aria"))
            .unwrap();

        // Sole member: the room closes with nobody left to notify.
        assert!(dispatcher.disconnect(a).notices.is_empty());
        assert!(dispatcher.registry().is_empty());

        // The duplicate disconnect is a pure no-op.
        assert!(dispatcher.disconnect(a).notices.is_empty());
    }

    #[test]
    fn test_who_lists_roster() {
        let dispatcher = dispatcher();
        let a = PlayerId::new();
        let b = PlayerId::new();
        dispatcher
            .dispatch(request(a, "create", Some("a1"), "aria"))
            .unwrap();
        dispatcher
            .dispatch(request(b, "join", Some("a1"), "bram"))
            .unwrap();

        let outcome = dispatcher.dispatch(request(a, "who", None, "aria")).unwrap();
        assert_eq!(outcome.notices.len(), 1);
        let script = &outcome.notices[0].script;
        assert!(script.contains("aria"));
        assert!(script.contains("bram"));
    }

    #[test]
    fn test_help_answers_caller_only() {
        let dispatcher = dispatcher();
        let actor = PlayerId::new();
        let outcome = dispatcher
            .dispatch(request(actor, "help", Some("battle"), "aria"))
            .unwrap();
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].scope, Scope::Actor(actor));
        assert!(outcome.notices[0].script.contains("start"));
    }
}
