//! Broadcast fanout: delivers committed state-change notifications to
//! exactly the right set of connected participants.
//!
//! Delivery is fire-and-forget by design — no acknowledgment, no retry,
//! no backpressure. A failure for one recipient is logged and dropped
//! without aborting delivery to the rest, so a stale socket can never
//! stall another member's session.
//!
//! Room membership is read from the registry *at the moment of
//! delivery*, never from a cached list: a member who left an instant
//! earlier is excluded even when the leave and the broadcast race.
//! Callers only hand outcomes to the fanout after the registry has
//! committed the transition, which keeps every broadcast causally behind
//! the state it describes.

use crate::dispatch::{Notice, Outcome, Scope};
use crate::registry::RoomRegistry;
use crate::types::{PlayerId, PlayerIdentity, PlayerState};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// The wire-ready notification payload handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundPayload {
    /// UI routing hint (which client pane renders the text).
    pub field: String,
    /// Display text.
    pub script: String,
    /// Acting player's identity, present on individual confirmations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<PlayerIdentity>,
    /// Updated state snapshot, present on individual confirmations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PlayerState>,
}

impl From<&Notice> for OutboundPayload {
    fn from(notice: &Notice) -> Self {
        Self {
            field: notice.field.to_string(),
            script: notice.script.clone(),
            identity: notice.identity.clone(),
            state: notice.state.clone(),
        }
    }
}

/// Transport seam: pushes one payload to one connection.
///
/// Implementations must not retry; the fanout treats every send as
/// best-effort and per-recipient independent.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// Delivers a payload to a single connection.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the message was queued, or an error string when the
    /// connection is gone or the push failed.
    async fn send(&self, actor: PlayerId, payload: OutboundPayload) -> Result<(), String>;
}

/// Fans committed notifications out to actors and rooms.
pub struct Fanout {
    registry: Arc<RoomRegistry>,
    sender: Arc<dyn ChannelSender>,
}

impl Fanout {
    /// Creates a fanout over the shared registry and a transport sender.
    pub fn new(registry: Arc<RoomRegistry>, sender: Arc<dyn ChannelSender>) -> Self {
        Self { registry, sender }
    }

    /// Delivers a payload to exactly one connection. Failures are logged
    /// and dropped.
    pub async fn notify_actor(&self, actor: PlayerId, payload: OutboundPayload) {
        if let Err(e) = self.sender.send(actor, payload).await {
            warn!("dropping notification for {}: {}", actor, e);
        }
    }

    /// Delivers a payload to every *current* member of the room, looked
    /// up from the registry at this instant. Per-recipient failures do
    /// not abort delivery to the remaining members.
    pub async fn notify_room(&self, room: &str, payload: OutboundPayload) {
        let members = self.registry.members_of(room);
        if members.is_empty() {
            debug!("room '{}' has no members to notify", room);
            return;
        }
        for member in members {
            if let Err(e) = self.sender.send(member, payload.clone()).await {
                warn!("dropping room '{}' notification for {}: {}", room, member, e);
            }
        }
    }

    /// Drains a dispatcher outcome in order.
    pub async fn deliver(&self, outcome: Outcome) {
        for notice in &outcome.notices {
            let payload = OutboundPayload::from(notice);
            match &notice.scope {
                Scope::Actor(actor) => self.notify_actor(*actor, payload).await,
                Scope::Room(room) => self.notify_room(room, payload).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Member;
    use tokio::sync::Mutex;

    /// Test sender that records every delivery.
    #[derive(Default)]
    struct RecordingSender {
        deliveries: Mutex<Vec<(PlayerId, OutboundPayload)>>,
        fail_for: Option<PlayerId>,
    }

    #[async_trait]
    impl ChannelSender for RecordingSender {
        async fn send(&self, actor: PlayerId, payload: OutboundPayload) -> Result<(), String> {
            if self.fail_for == Some(actor) {
                return Err("connection reset".to_string());
            }
            self.deliveries.lock().await.push((actor, payload));
            Ok(())
        }
    }

    fn payload(script: &str) -> OutboundPayload {
        OutboundPayload {
            field: "pvp_join".to_string(),
            script: script.to_string(),
            identity: None,
            state: None,
        }
    }

    fn member(name: &str) -> Member {
        Member {
            id: PlayerId::new(),
            identity: PlayerIdentity::named(name),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_notify_room_reaches_all_current_members() {
        let registry = Arc::new(RoomRegistry::new());
        let aria = member("aria");
        let bram = member("bram");
        let (a, b) = (aria.id, bram.id);
        registry.create("pvp-room a1", aria).unwrap();
        registry.join("pvp-room a1", bram).unwrap();

        let sender = Arc::new(RecordingSender::default());
        let fanout = Fanout::new(registry, sender.clone());
        fanout.notify_room("pvp-room a1", payload("begin")).await;

        let deliveries = sender.deliveries.lock().await;
        let recipients: Vec<PlayerId> = deliveries.iter().map(|(id, _)| *id).collect();
        assert_eq!(recipients, vec![a, b]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_notify_room_uses_membership_at_delivery_time() {
        let registry = Arc::new(RoomRegistry::new());
        let aria = member("aria");
        let bram = member("bram");
        let (a, b) = (aria.id, bram.id);
        registry.create("pvp-room a1", aria).unwrap();
        registry.join("pvp-room a1", bram).unwrap();

        let sender = Arc::new(RecordingSender::default());
        let fanout = Fanout::new(registry.clone(), sender.clone());

        // A leaves between the state change and the broadcast: the
        // delivery set reflects the registry's present membership.
        registry.leave("pvp-room a1", a).unwrap();
        fanout.notify_room("pvp-room a1", payload("update")).await;

        let deliveries = sender.deliveries.lock().await;
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, b);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_recipient_does_not_block_the_rest() {
        let registry = Arc::new(RoomRegistry::new());
        let aria = member("aria");
        let bram = member("bram");
        let (a, b) = (aria.id, bram.id);
        registry.create("pvp-room a1", aria).unwrap();
        registry.join("pvp-room a1", bram).unwrap();

        let sender = Arc::new(RecordingSender {
            fail_for: Some(a),
            ..Default::default()
        });
        let fanout = Fanout::new(registry, sender.clone());
        fanout.notify_room("pvp-room a1", payload("begin")).await;

        let deliveries = sender.deliveries.lock().await;
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, b);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_notify_missing_room_is_silent() {
        let registry = Arc::new(RoomRegistry::new());
        let sender = Arc::new(RecordingSender::default());
        let fanout = Fanout::new(registry, sender.clone());
        fanout.notify_room("nowhere", payload("void")).await;
        assert!(sender.deliveries.lock().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_deliver_preserves_notice_order() {
        let registry = Arc::new(RoomRegistry::new());
        let aria = member("aria");
        let a = aria.id;
        registry.create("pvp-room a1", aria).unwrap();

        let sender = Arc::new(RecordingSender::default());
        let fanout = Fanout::new(registry, sender.clone());

        let outcome = Outcome {
            notices: vec![
                Notice {
                    scope: Scope::Actor(a),
                    field: "pvp_join",
                    script: "first".to_string(),
                    identity: None,
                    state: None,
                },
                Notice {
                    scope: Scope::Room("pvp-room a1".to_string()),
                    field: "pvp_join",
                    script: "second".to_string(),
                    identity: None,
                    state: None,
                },
            ],
        };
        fanout.deliver(outcome).await;

        let deliveries = sender.deliveries.lock().await;
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].1.script, "first");
        assert_eq!(deliveries[1].1.script, "second");
    }
}
