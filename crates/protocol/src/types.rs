//! Shared type definitions
//!
//! Value objects carried inside wire messages. These mirror the server's
//! JSON vocabulary exactly; renames pin the uppercase wire spellings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Room & Mode Types
// =============================================================================

/// Which guessing game the room is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    #[serde(rename = "FLAG")]
    Flag,
    #[serde(rename = "WORLD_MAP")]
    WorldMap,
}

impl GameMode {
    /// Wire spelling, as used in URLs and persisted settings.
    pub fn as_str(self) -> &'static str {
        match self {
            GameMode::Flag => "FLAG",
            GameMode::WorldMap => "WORLD_MAP",
        }
    }

    /// Parse the wire spelling back into a mode.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "FLAG" => Some(GameMode::Flag),
            "WORLD_MAP" => Some(GameMode::WorldMap),
            _ => None,
        }
    }
}

/// Visibility/ownership class of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "SINGLE")]
    Single,
    #[serde(rename = "PRIVATE")]
    Private,
    #[serde(rename = "PUBLIC")]
    Public,
}

impl RoomType {
    /// Wire spelling, as used in URLs and persisted settings.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomType::Single => "SINGLE",
            RoomType::Private => "PRIVATE",
            RoomType::Public => "PUBLIC",
        }
    }

    /// Parse the wire spelling back into a room type.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "SINGLE" => Some(RoomType::Single),
            "PRIVATE" => Some(RoomType::Private),
            "PUBLIC" => Some(RoomType::Public),
            _ => None,
        }
    }
}

/// Pacing variant for WORLD_MAP rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapPlayMode {
    #[serde(rename = "TIMED")]
    Timed,
    #[serde(rename = "FREE")]
    Free,
}

impl MapPlayMode {
    /// Wire spelling, as used in URLs and persisted settings.
    pub fn as_str(self) -> &'static str {
        match self {
            MapPlayMode::Timed => "TIMED",
            MapPlayMode::Free => "FREE",
        }
    }

    /// Parse the wire spelling back into a play mode.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "TIMED" => Some(MapPlayMode::Timed),
            "FREE" => Some(MapPlayMode::Free),
            _ => None,
        }
    }
}

/// Server-declared lifecycle phase of the room's game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Waiting,
    InProgress,
    Completed,
    /// Terminal state broadcast just before the room is torn down.
    Closed,
}

// =============================================================================
// Game State Types
// =============================================================================

/// Current question posed to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(default)]
    pub flag_code: Option<String>,
    pub country_name: String,
    #[serde(default)]
    pub country_code: Option<String>,
    pub time_limit: u32,
}

/// Full authoritative game state as the server declares it.
///
/// Sent wholesale on `game_started`, `round_started` and `game_completed`.
/// Map fields may be omitted by older servers, so they default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    #[serde(default)]
    pub question: Option<Question>,
    #[serde(default)]
    pub scores: BTreeMap<String, i64>,
    #[serde(default)]
    pub time_remaining: Option<u32>,
    /// Absolute round deadline (epoch milliseconds), when the server sends one.
    #[serde(default)]
    pub deadline: Option<i64>,
    pub game_mode: GameMode,
    pub room_type: RoomType,
    #[serde(default)]
    pub map_mode: Option<MapPlayMode>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub painted_countries: BTreeMap<String, String>,
    #[serde(default)]
    pub current_country: Option<String>,
    #[serde(default)]
    pub player_colors: BTreeMap<String, String>,
}

// =============================================================================
// Room Roster
// =============================================================================

/// Roster broadcast whenever room membership or settings change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUpdate {
    pub players: Vec<String>,
    pub current_count: u32,
    pub status: GameStatus,
    pub current_round: u32,
    #[serde(default)]
    pub total_rounds: Option<u32>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub game_mode: Option<GameMode>,
    #[serde(default)]
    pub room_type: Option<RoomType>,
    #[serde(default)]
    pub map_mode: Option<MapPlayMode>,
    #[serde(default)]
    pub player_colors: BTreeMap<String, String>,
    #[serde(default)]
    pub player_avatars: BTreeMap<String, String>,
}
