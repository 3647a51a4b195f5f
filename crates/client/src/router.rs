//! Inbound frame routing.
//!
//! One frame in, exactly one effect out: a snapshot merge, a chat log
//! mutation, or a notice on the event bus. Malformed frames are logged and
//! dropped (a bad frame from the server must never take the session down),
//! and unknown message types are ignored for forward compatibility.

use std::sync::Arc;

use geoclash_protocol::ServerMessage;

use crate::chat::ChatLog;
use crate::messaging::{EventBus, SessionNotice};
use crate::ports::TimeProvider;
use crate::snapshot::{merge, GameSnapshot};

const DEFAULT_COLLISION_MESSAGE: &str = "This session is already active in this room";

/// Routes parsed server messages into the session's client-side state.
pub struct MessageRouter {
    snapshot: Option<GameSnapshot>,
    chat: ChatLog,
    notices: EventBus,
    clock: Arc<dyn TimeProvider>,
}

impl MessageRouter {
    pub fn new(notices: EventBus, clock: Arc<dyn TimeProvider>) -> Self {
        Self {
            snapshot: None,
            chat: ChatLog::new(),
            notices,
            clock,
        }
    }

    /// Consume one raw inbound frame.
    pub fn dispatch(&mut self, raw: &str) {
        let msg = match ServerMessage::parse(raw) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return;
            }
        };

        match &msg {
            ServerMessage::GameStarted(_)
            | ServerMessage::RoundStarted(_)
            | ServerMessage::GameCompleted(_)
            | ServerMessage::TimerUpdate(_)
            | ServerMessage::ScoreUpdate(_)
            | ServerMessage::CountryPainted(_) => {
                self.snapshot = merge(self.snapshot.take(), &msg);
            }

            ServerMessage::ChatMessage(broadcast) => {
                let now_ms = self.clock.now_millis() as i64;
                self.chat.push_broadcast(broadcast, now_ms);
            }
            ServerMessage::MessageReaction(reaction) => {
                self.chat.toggle_reaction(reaction);
            }

            ServerMessage::RoomUpdate(update) => {
                self.notices.dispatch(SessionNotice::RoomUpdate(update.clone()));
            }
            ServerMessage::AnswerSubmitted(answer) => {
                self.notices
                    .dispatch(SessionNotice::AnswerSubmitted(answer.clone()));
            }
            ServerMessage::SessionCollision(collision) => {
                let message = collision
                    .message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COLLISION_MESSAGE.to_owned());
                self.notices
                    .dispatch(SessionNotice::SessionCollision { message });
            }
            ServerMessage::RoomClosed(notice) => {
                // The room is gone; the snapshot dies with it.
                self.snapshot = None;
                self.notices.dispatch(SessionNotice::RoomClosed {
                    message: notice.message.clone(),
                });
            }
            ServerMessage::RoomExpired(_) => {
                self.snapshot = None;
                self.notices.dispatch(SessionNotice::RoomExpired);
            }
            ServerMessage::ColorRejected(rejected) => {
                self.notices.dispatch(SessionNotice::ColorRejected {
                    color: rejected.color.clone(),
                    error: rejected.error.clone(),
                });
            }

            ServerMessage::Unknown => {
                tracing::debug!("ignoring unknown message type");
            }
        }
    }

    pub fn snapshot(&self) -> Option<&GameSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Discard all per-room state (view unmount).
    pub fn reset(&mut self) {
        self.snapshot = None;
        self.chat = ChatLog::new();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use geoclash_protocol::GameStatus;

    use super::*;
    use crate::ports::MockTimeProvider;

    fn router_with_bus() -> (MessageRouter, Arc<Mutex<Vec<SessionNotice>>>) {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |notice| {
            if let Ok(mut seen) = sink.lock() {
                seen.push(notice);
            }
        });
        let mut clock = MockTimeProvider::new();
        clock.expect_now_millis().return_const(1_000_u64);
        (MessageRouter::new(bus, Arc::new(clock)), seen)
    }

    const GAME_STARTED: &str = r#"{
        "type": "game_started",
        "payload": {
            "status": "in_progress",
            "current_round": 1,
            "total_rounds": 10,
            "scores": {"ada": 0},
            "game_mode": "FLAG",
            "room_type": "PRIVATE"
        }
    }"#;

    #[test]
    fn test_malformed_frames_are_dropped_quietly() {
        let (mut router, notices) = router_with_bus();
        router.dispatch("{{{{not json");
        router.dispatch(r#"{"type":"score_update","payload":{"scores":42}}"#);
        assert!(router.snapshot().is_none());
        assert!(notices.lock().map(|n| n.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_unknown_types_are_ignored() {
        let (mut router, notices) = router_with_bus();
        router.dispatch(GAME_STARTED);
        router.dispatch(r#"{"type":"confetti_burst","payload":{"amount":"lots"}}"#);
        assert!(router.snapshot().is_some());
        assert!(notices.lock().map(|n| n.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_snapshot_family_merges() {
        let (mut router, _) = router_with_bus();
        router.dispatch(GAME_STARTED);
        router.dispatch(r#"{"type":"score_update","payload":{"scores":{"ada":3}}}"#);

        let snapshot = router.snapshot().expect("snapshot");
        assert_eq!(snapshot.status, GameStatus::InProgress);
        assert_eq!(snapshot.scores.get("ada"), Some(&3));
    }

    #[test]
    fn test_chat_flows_to_the_log_not_the_snapshot() {
        let (mut router, _) = router_with_bus();
        router.dispatch(
            r#"{"type":"chat_message","payload":{"player_name":"ada","message":"gg"}}"#,
        );
        assert!(router.snapshot().is_none());
        assert_eq!(router.chat().messages().len(), 1);
        assert_eq!(router.chat().messages()[0].text, "gg");
        // No server timestamp: the injected clock supplies one.
        assert_eq!(router.chat().messages()[0].timestamp_ms, 1_000);
    }

    #[test]
    fn test_collision_becomes_a_notice_with_default_message() {
        let (mut router, notices) = router_with_bus();
        router.dispatch(r#"{"type":"session_collision","payload":{}}"#);
        let notices = notices.lock().expect("notices");
        assert_eq!(
            notices.as_slice(),
            [SessionNotice::SessionCollision {
                message: DEFAULT_COLLISION_MESSAGE.to_owned()
            }]
        );
    }

    #[test]
    fn test_room_closed_discards_snapshot_and_notifies() {
        let (mut router, notices) = router_with_bus();
        router.dispatch(GAME_STARTED);
        assert!(router.snapshot().is_some());

        router.dispatch(r#"{"type":"room_closed","payload":{"message":"bye"}}"#);
        assert!(router.snapshot().is_none());
        let notices = notices.lock().expect("notices");
        assert_eq!(
            notices.as_slice(),
            [SessionNotice::RoomClosed {
                message: Some("bye".to_owned())
            }]
        );
    }
}
