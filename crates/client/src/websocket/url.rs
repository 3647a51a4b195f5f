//! Connection URL construction.
//!
//! Everything the server needs to admit a client rides the upgrade request's
//! query string: room, identity, and the room settings used when this client
//! is the one creating the room.

use url::Url;

use geoclash_protocol::{GameMode, RoomType};

use crate::error::ClientError;

pub const DEFAULT_ROUNDS: u32 = 10;
pub const DEFAULT_ROUND_TIMEOUT_SECS: u32 = 15;

/// Parameters for opening a game session.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    /// WebSocket endpoint, e.g. `wss://host/ws`.
    pub base_url: String,
    pub room_code: String,
    pub display_name: String,
    pub session_id: String,
    /// Opaque bearer token; empty on the wire for guests.
    pub auth_token: Option<String>,
    pub game_mode: GameMode,
    pub room_type: RoomType,
    pub rounds: u32,
    pub round_timeout_secs: u32,
}

impl ConnectParams {
    /// Build the full connection URL with all parameters percent-encoded.
    pub fn connect_url(&self) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)?;
        url.query_pairs_mut()
            .append_pair("room", &self.room_code)
            .append_pair("username", &self.display_name)
            .append_pair("session", &self.session_id)
            .append_pair("mode", self.game_mode.as_str())
            .append_pair("type", self.room_type.as_str())
            .append_pair("rounds", &self.rounds.to_string())
            .append_pair("timeout", &self.round_timeout_secs.to_string())
            .append_pair("token", self.auth_token.as_deref().unwrap_or(""));
        Ok(url)
    }
}
