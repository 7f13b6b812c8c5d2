//! Script catalog: opaque lookup from (command, context) to display text.
//!
//! The catalog is flavor text only — the dispatcher decides *what*
//! happened, the catalog decides *how it reads*. Every command the
//! dispatcher can legally route resolves to a stable non-empty string,
//! and unknown keys hit a defined fallback instead of panicking.

/// Help topics a player can ask about.
pub const HELP_TOPICS: [&str; 4] = ["npc", "list", "join", "battle"];

/// Resolves display text for battle-session events.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptCatalog;

impl ScriptCatalog {
    /// Creates the catalog. Stateless today; constructed explicitly so a
    /// locale-aware table can slot in behind the same interface.
    pub fn new() -> Self {
        Self
    }

    /// Generic lookup by command token and optional context, for callers
    /// that only know the wire-level command name.
    ///
    /// # Returns
    ///
    /// A stable non-empty string; unknown commands resolve to the
    /// wrong-command fallback.
    pub fn resolve(&self, command: &str, context: Option<&str>) -> String {
        match command {
            "create" | "join" => self.room_join(context.unwrap_or("someone")),
            "start" => self.battle_start(),
            "leave" => self.village(),
            "who" => self.roster_header(),
            "help" => self.help(context.unwrap_or("")),
            other => self.wrong_command(other),
        }
    }

    /// Announcement when a player enters a room.
    pub fn room_join(&self, name: &str) -> String {
        format!("{name} steps into the arena, looking for a fight.")
    }

    /// Room-wide announcement when the battle begins.
    pub fn battle_start(&self) -> String {
        "The gates slam shut. The battle begins!".to_string()
    }

    /// Text shown to a player returning to the village after leaving.
    pub fn village(&self) -> String {
        "You return to the village square.".to_string()
    }

    /// Room-wide announcement when an opponent leaves or disconnects.
    pub fn opponent_left(&self) -> String {
        "Your opponent has fled. The arena falls silent.".to_string()
    }

    /// Notice sent when a room is reclaimed as stale.
    pub fn room_expired(&self) -> String {
        "The arena stood empty too long and has been torn down.".to_string()
    }

    /// Header line for the roster listing.
    pub fn roster_header(&self) -> String {
        "Fighters in this arena:".to_string()
    }

    /// Rejection shown when a player tries to open or enter a room while
    /// already occupying one.
    pub fn already_in_room(&self, room: &str) -> String {
        format!("You are already fighting in '{room}'. Leave it first.")
    }

    /// Rejection shown when a room command needs the player to be in a
    /// room and they are not.
    pub fn not_in_room(&self) -> String {
        "You are not in an arena right now.".to_string()
    }

    /// Soft-fail response for a command token the dispatcher does not
    /// recognize.
    pub fn wrong_command(&self, command: &str) -> String {
        format!("'{command}' is not a command anyone here understands.")
    }

    /// Help text by topic, with a defined fallback for unknown topics.
    pub fn help(&self, topic: &str) -> String {
        match topic {
            "npc" => "Talk to the arena keeper: create <name> to open a room.".to_string(),
            "list" => "who — list the fighters in your current room.".to_string(),
            "join" => "join <name> — enter an open room and square up.".to_string(),
            "battle" => "start — begin the battle once the room is full.".to_string(),
            _ => format!(
                "No help for '{topic}'. Topics: {}.",
                HELP_TOPICS.join(", ")
            ),
        }
    }
}
