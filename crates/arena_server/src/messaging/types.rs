//! Wire message definitions for client-server communication.
//!
//! The JSON field names (`userInfo`, `userStatus`) are the contract the
//! game client already speaks; the core works with its own type names
//! and these shims translate at the boundary.

use arena_core::{OutboundPayload, PlayerIdentity, PlayerState};
use serde::{Deserialize, Serialize};

/// A message sent from a client to the server.
///
/// # Example
///
/// ```json
/// {
///   "command": "join",
///   "argument": "a1",
///   "userInfo": { "name": "aria", "level": 3 },
///   "userStatus": { "hp": 100, "mp": 40 }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// The command token to dispatch.
    pub command: String,

    /// Command argument (room key or help topic), when present.
    #[serde(default)]
    pub argument: Option<String>,

    /// The caller's identity payload.
    #[serde(rename = "userInfo", default)]
    pub user_info: Option<PlayerIdentity>,

    /// The caller's declared state payload.
    #[serde(rename = "userStatus", default)]
    pub user_status: Option<PlayerState>,
}

/// A notification pushed to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// UI routing hint (which pane renders the text).
    pub field: String,

    /// Display text.
    pub script: String,

    /// Acting player's identity, present on individual confirmations.
    #[serde(rename = "userInfo", skip_serializing_if = "Option::is_none")]
    pub user_info: Option<PlayerIdentity>,

    /// Updated state snapshot, present on individual confirmations.
    #[serde(rename = "userStatus", skip_serializing_if = "Option::is_none")]
    pub user_status: Option<PlayerState>,
}

impl From<OutboundPayload> for OutboundMessage {
    fn from(payload: OutboundPayload) -> Self {
        Self {
            field: payload.field,
            script: payload.script,
            user_info: payload.identity,
            user_status: payload.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_parses_original_field_names() {
        let text = r#"{
            "command": "create",
            "argument": "a1",
            "userInfo": { "name": "aria", "level": 3 },
            "userStatus": { "hp": 100, "mp": 40 }
        }"#;
        let message: InboundMessage = serde_json::from_str(text).unwrap();
        assert_eq!(message.command, "create");
        assert_eq!(message.argument.as_deref(), Some("a1"));
        assert_eq!(message.user_info.unwrap().name, "aria");
        assert_eq!(message.user_status.unwrap().hp, 100);
    }

    #[test]
    fn test_inbound_tolerates_missing_payloads() {
        let message: InboundMessage =
            serde_json::from_str(r#"{ "command": "help" }"#).unwrap();
        assert!(message.user_info.is_none());
        assert!(message.user_status.is_none());
    }

    #[test]
    fn test_outbound_omits_absent_payloads() {
        let message = OutboundMessage {
            field: "pvp_battle".to_string(),
            script: "begin".to_string(),
            user_info: None,
            user_status: None,
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("userInfo"));
        assert!(!json.contains("userStatus"));
    }
}
