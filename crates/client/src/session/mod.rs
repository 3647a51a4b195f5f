//! Session identity and room footprint persistence.
//!
//! The session identifier is a 32-byte random token, hex encoded, created
//! once per tab and kept in the tab-scoped store so two tabs never share it.
//! The display name and auth token live in the shared store and survive
//! across tabs. The room footprint (room code plus room settings) is what a
//! reloaded tab uses to re-enter the room it was in.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::{Rng, RngCore};

use geoclash_protocol::{GameMode, MapPlayMode, RoomType};

use crate::ports::StorageProvider;

// Storage keys. Tab-scoped unless noted.
const KEY_SESSION_ID: &str = "sessionId";
const KEY_USERNAME: &str = "username"; // shared
const KEY_AUTH_TOKEN: &str = "token"; // shared
const KEY_ROOM_CODE: &str = "currentRoomCode";
const KEY_GAME_MODE: &str = "gameMode";
const KEY_ROOM_TYPE: &str = "roomType";
const KEY_ROUNDS: &str = "rounds";
const KEY_MAP_MODE: &str = "mapMode";

const SESSION_TOKEN_BYTES: usize = 32;
const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Who this tab claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    /// Per-tab session token (64 hex characters).
    pub session_id: String,
    pub display_name: String,
    /// Opaque bearer token; absent for guest players.
    pub auth_token: Option<String>,
}

impl SessionIdentity {
    pub fn is_guest(&self) -> bool {
        self.auth_token.is_none()
    }
}

/// Room settings a tab remembers so a reload can restore the same room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomFootprint {
    pub room_code: String,
    pub game_mode: GameMode,
    pub room_type: RoomType,
    pub rounds: u32,
    pub map_mode: Option<MapPlayMode>,
}

/// Facade over the two storage scopes holding all persisted session state.
#[derive(Clone)]
pub struct SessionStore {
    tab: Arc<dyn StorageProvider>,
    shared: Arc<dyn StorageProvider>,
}

impl SessionStore {
    pub fn new(tab: Arc<dyn StorageProvider>, shared: Arc<dyn StorageProvider>) -> Self {
        Self { tab, shared }
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Return the tab's session id, generating and persisting one on first use.
    pub fn ensure_session_id(&self) -> String {
        if let Some(existing) = self.tab.load(KEY_SESSION_ID) {
            return existing;
        }
        let id = generate_session_id();
        self.tab.save(KEY_SESSION_ID, &id);
        id
    }

    pub fn display_name(&self) -> Option<String> {
        self.shared.load(KEY_USERNAME)
    }

    pub fn set_display_name(&self, name: &str) {
        self.shared.save(KEY_USERNAME, name);
    }

    pub fn auth_token(&self) -> Option<String> {
        self.shared.load(KEY_AUTH_TOKEN)
    }

    pub fn set_auth_token(&self, token: &str) {
        self.shared.save(KEY_AUTH_TOKEN, token);
    }

    /// Restore the identity persisted by an earlier visit, if complete.
    pub fn identity(&self) -> Option<SessionIdentity> {
        let session_id = self.tab.load(KEY_SESSION_ID)?;
        let display_name = self.display_name()?;
        Some(SessionIdentity {
            session_id,
            display_name,
            auth_token: self.auth_token(),
        })
    }

    /// Create (or refresh) the identity for this tab under the given name.
    pub fn create_identity(&self, display_name: &str) -> SessionIdentity {
        let session_id = self.ensure_session_id();
        self.set_display_name(display_name);
        SessionIdentity {
            session_id,
            display_name: display_name.to_owned(),
            auth_token: self.auth_token(),
        }
    }

    /// Forget everything identifying this user (explicit logout/leave).
    pub fn clear_identity(&self) {
        self.tab.remove(KEY_SESSION_ID);
        self.shared.remove(KEY_USERNAME);
        self.shared.remove(KEY_AUTH_TOKEN);
    }

    /// Drop only this tab's claim to its session (collision "exit" path);
    /// the shared display name and token stay.
    pub fn clear_session_id(&self) {
        self.tab.remove(KEY_SESSION_ID);
    }

    // -------------------------------------------------------------------------
    // Room footprint
    // -------------------------------------------------------------------------

    pub fn save_footprint(&self, footprint: &RoomFootprint) {
        self.tab.save(KEY_ROOM_CODE, &footprint.room_code);
        self.tab.save(KEY_GAME_MODE, footprint.game_mode.as_str());
        self.tab.save(KEY_ROOM_TYPE, footprint.room_type.as_str());
        self.tab.save(KEY_ROUNDS, &footprint.rounds.to_string());
        match footprint.map_mode {
            Some(mode) => self.tab.save(KEY_MAP_MODE, mode.as_str()),
            None => self.tab.remove(KEY_MAP_MODE),
        }
    }

    pub fn load_footprint(&self) -> Option<RoomFootprint> {
        let room_code = self.tab.load(KEY_ROOM_CODE)?;
        let game_mode = GameMode::parse(&self.tab.load(KEY_GAME_MODE)?)?;
        let room_type = RoomType::parse(&self.tab.load(KEY_ROOM_TYPE)?)?;
        let rounds = self
            .tab
            .load(KEY_ROUNDS)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(10);
        let map_mode = self
            .tab
            .load(KEY_MAP_MODE)
            .and_then(|raw| MapPlayMode::parse(&raw));
        Some(RoomFootprint {
            room_code,
            game_mode,
            room_type,
            rounds,
            map_mode,
        })
    }

    pub fn clear_footprint(&self) {
        self.tab.remove(KEY_ROOM_CODE);
        self.tab.remove(KEY_GAME_MODE);
        self.tab.remove(KEY_ROOM_TYPE);
        self.tab.remove(KEY_ROUNDS);
        self.tab.remove(KEY_MAP_MODE);
    }

    // -------------------------------------------------------------------------
    // Per-room color choice
    // -------------------------------------------------------------------------

    pub fn save_room_color(&self, room_code: &str, player: &str, color: &str) {
        self.tab.save(&color_key(room_code, player), color);
    }

    pub fn room_color(&self, room_code: &str, player: &str) -> Option<String> {
        self.tab.load(&color_key(room_code, player))
    }
}

fn color_key(room_code: &str, player: &str) -> String {
    format!("color_{room_code}_{player}")
}

/// Generate a fresh session token: 32 cryptographically random bytes, hex.
fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a short shareable room code (6 uppercase alphanumerics).
pub fn generate_room_code() -> String {
    let mut rng = OsRng;
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ROOM_CODE_CHARS.len());
            ROOM_CODE_CHARS[idx] as char
        })
        .collect()
}
