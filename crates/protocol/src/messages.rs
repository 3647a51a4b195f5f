//! WebSocket message types for server-client communication
//!
//! Every frame on the wire is a `{"type": ..., "payload": ...}` envelope.
//! Outbound messages serialize through the adjacently-tagged derive; inbound
//! frames go through [`ServerMessage::parse`], which maps unknown `type`
//! values to [`ServerMessage::Unknown`] so the server can grow its vocabulary
//! without breaking deployed clients.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{GameState, MapPlayMode, RoomUpdate};

// =============================================================================
// Server Messages (Server → Client)
// =============================================================================

/// Messages from the game server to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new game began; payload is the full authoritative state.
    GameStarted(GameState),
    /// A new round began; payload is the full authoritative state.
    RoundStarted(GameState),
    /// Room membership or settings changed.
    RoomUpdate(RoomUpdate),
    /// Countdown tick for the current round.
    TimerUpdate(TimerUpdate),
    /// A player's answer was judged.
    AnswerSubmitted(AnswerSubmitted),
    /// Scoreboard changed.
    ScoreUpdate(ScoreUpdate),
    /// A country was claimed on the shared map.
    CountryPainted(CountryPainted),
    /// The game finished; payload is the full final state.
    GameCompleted(GameState),
    /// A chat line from another player (or this one, echoed back).
    ChatMessage(ChatBroadcast),
    /// An emoji reaction was toggled on a chat message.
    MessageReaction(MessageReaction),
    /// Another connection claims this session in this room.
    SessionCollision(SessionCollision),
    /// The owner closed the room.
    RoomClosed(RoomNotice),
    /// The room expired server-side.
    RoomExpired(RoomNotice),
    /// The requested player color is already taken.
    ColorRejected(ColorRejected),
    /// Any message type this client build does not recognize.
    Unknown,
}

/// Raw `{type, payload}` envelope, parsed before variant dispatch.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl ServerMessage {
    /// Parse a raw text frame into a typed message.
    ///
    /// Unrecognized `type` values yield [`ServerMessage::Unknown`]; a frame
    /// that is not a valid envelope, or whose payload does not match the
    /// declared type, is an error the caller is expected to log and drop.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(text)?;
        let payload = envelope.payload;
        let msg = match envelope.kind.as_str() {
            "game_started" => Self::GameStarted(serde_json::from_value(payload)?),
            "round_started" => Self::RoundStarted(serde_json::from_value(payload)?),
            "room_update" => Self::RoomUpdate(serde_json::from_value(payload)?),
            "timer_update" => Self::TimerUpdate(serde_json::from_value(payload)?),
            "answer_submitted" => Self::AnswerSubmitted(serde_json::from_value(payload)?),
            "score_update" => Self::ScoreUpdate(serde_json::from_value(payload)?),
            "country_painted" => Self::CountryPainted(serde_json::from_value(payload)?),
            "game_completed" => Self::GameCompleted(serde_json::from_value(payload)?),
            "chat_message" => Self::ChatMessage(serde_json::from_value(payload)?),
            "message_reaction" => Self::MessageReaction(serde_json::from_value(payload)?),
            // Notice payloads are advisory; tolerate absent or odd shapes.
            "session_collision" => {
                Self::SessionCollision(serde_json::from_value(payload).unwrap_or_default())
            }
            "room_closed" => Self::RoomClosed(serde_json::from_value(payload).unwrap_or_default()),
            "room_expired" => {
                Self::RoomExpired(serde_json::from_value(payload).unwrap_or_default())
            }
            "color_rejected" => {
                Self::ColorRejected(serde_json::from_value(payload).unwrap_or_default())
            }
            _ => Self::Unknown,
        };
        Ok(msg)
    }
}

/// Countdown tick payload. `deadline` is epoch milliseconds when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerUpdate {
    pub time_remaining: u32,
    #[serde(default)]
    pub deadline: Option<i64>,
}

/// Verdict broadcast after a player submits an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSubmitted {
    pub player: String,
    pub is_correct: bool,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Scoreboard patch; only the players present in `scores` are updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub scores: BTreeMap<String, i64>,
}

/// Map-claim patch carrying the latest painted-country and color maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryPainted {
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    pub painted_countries: BTreeMap<String, String>,
    #[serde(default)]
    pub player_colors: Option<BTreeMap<String, String>>,
}

/// A chat line relayed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBroadcast {
    pub player_name: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Reaction toggle on an existing chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReaction {
    pub message_id: String,
    pub emoji: String,
    pub username: String,
}

/// Duplicate-session notice. The server keeps both connections alive;
/// resolution is a human decision on this client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCollision {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Teardown notice for `room_closed` / `room_expired`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomNotice {
    #[serde(default)]
    pub message: Option<String>,
}

/// Color-choice rejection; the client should re-prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorRejected {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

// =============================================================================
// Client Messages (Client → Server)
// =============================================================================

/// Messages from the client to the game server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit an answer for the current question.
    SubmitAnswer {
        answer: String,
        response_time_ms: u64,
    },
    /// Send a chat line. Reactions ride this variant too, encoded as
    /// `REACTION:<message_id>:<emoji>` by convention.
    ChatMessage { message: String },
    /// Owner starts the game.
    StartGame,
    /// Claim a player color.
    ColorSelected { color: String },
    /// Owner switches the map pacing mode.
    SetMapMode { map_play_mode: MapPlayMode },
    /// Owner changes the round count before start.
    SetRounds { rounds: u32 },
    /// Owner restarts a completed game.
    RestartGame,
    /// Owner closes the room for everyone.
    CloseRoom,
}
