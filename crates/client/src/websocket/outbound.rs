//! ClientMessage construction helpers.
//!
//! Centralizes outbound message construction so callers never hand-assemble
//! wire payloads, and the reaction-as-chat convention lives in one place.

use geoclash_protocol::{ClientMessage, MapPlayMode};

/// Builder for [`ClientMessage`] variants.
pub struct ClientMessageBuilder;

impl ClientMessageBuilder {
    /// Submit an answer with the measured response time.
    pub fn submit_answer(answer: &str, response_time_ms: u64) -> ClientMessage {
        ClientMessage::SubmitAnswer {
            answer: answer.to_owned(),
            response_time_ms,
        }
    }

    /// Send a plain chat line.
    pub fn chat_message(text: &str) -> ClientMessage {
        ClientMessage::ChatMessage {
            message: text.to_owned(),
        }
    }

    /// Toggle a reaction on a chat message.
    ///
    /// The wire carries reactions as specially-formatted chat text
    /// (`REACTION:<message_id>:<emoji>`); the server turns them into
    /// `message_reaction` broadcasts.
    pub fn reaction(message_id: &str, emoji: &str) -> ClientMessage {
        ClientMessage::ChatMessage {
            message: format!("REACTION:{message_id}:{emoji}"),
        }
    }

    /// Owner starts the game.
    pub fn start_game() -> ClientMessage {
        ClientMessage::StartGame
    }

    /// Claim a player color.
    pub fn color_selected(color: &str) -> ClientMessage {
        ClientMessage::ColorSelected {
            color: color.to_owned(),
        }
    }

    /// Owner switches the map pacing mode.
    pub fn set_map_mode(mode: MapPlayMode) -> ClientMessage {
        ClientMessage::SetMapMode {
            map_play_mode: mode,
        }
    }

    /// Owner changes the round count before start.
    pub fn set_rounds(rounds: u32) -> ClientMessage {
        ClientMessage::SetRounds { rounds }
    }

    /// Owner restarts a completed game.
    pub fn restart_game() -> ClientMessage {
        ClientMessage::RestartGame
    }

    /// Owner closes the room for everyone.
    pub fn close_room() -> ClientMessage {
        ClientMessage::CloseRoom
    }
}
