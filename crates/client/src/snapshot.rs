//! Game state reconciliation.
//!
//! [`merge`] is the single place inbound events touch the client's view of
//! the game. It is a pure function: no I/O, no clocks, and re-applying the
//! same event is always a no-op on an already-merged snapshot, so replayed
//! frames are harmless.
//!
//! Merge policy by event family:
//! - full replace: `game_started`, `round_started`, `game_completed`; the
//!   server is declaring fresh authoritative state
//! - scalar patch: `timer_update`; only the countdown fields change, and
//!   only for the FLAG mode, which is the one with a per-question timer
//! - map patch: `score_update`, `country_painted`; named keys are replaced,
//!   keys absent from the event are preserved
//!
//! A patch that arrives before any authoritative state exists has nothing to
//! patch and is discarded.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geoclash_protocol::{
    CountryPainted, GameMode, GameState, GameStatus, MapPlayMode, Question, RoomType,
    ScoreUpdate, ServerMessage, TimerUpdate,
};

/// The client's mutable copy of room/game state; the single source of truth
/// read by the view layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub status: GameStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    pub question: Option<Question>,
    pub scores: BTreeMap<String, i64>,
    pub time_remaining: Option<u32>,
    /// Absolute round deadline (epoch milliseconds), when known.
    pub deadline: Option<i64>,
    pub game_mode: GameMode,
    pub room_type: RoomType,
    pub map_mode: Option<MapPlayMode>,
    pub owner: Option<String>,
    pub current_country: Option<String>,
    pub painted_countries: BTreeMap<String, String>,
    pub player_colors: BTreeMap<String, String>,
}

impl From<GameState> for GameSnapshot {
    fn from(state: GameState) -> Self {
        Self {
            status: state.status,
            current_round: state.current_round,
            total_rounds: state.total_rounds,
            question: state.question,
            scores: state.scores,
            time_remaining: state.time_remaining,
            deadline: state.deadline,
            game_mode: state.game_mode,
            room_type: state.room_type,
            map_mode: state.map_mode,
            owner: state.owner,
            current_country: state.current_country,
            painted_countries: state.painted_countries,
            player_colors: state.player_colors,
        }
    }
}

/// Apply one server message to the current snapshot.
///
/// Messages outside the snapshot families (chat, notices, unknown types)
/// leave the snapshot untouched.
pub fn merge(current: Option<GameSnapshot>, msg: &ServerMessage) -> Option<GameSnapshot> {
    match msg {
        ServerMessage::GameStarted(state)
        | ServerMessage::RoundStarted(state)
        | ServerMessage::GameCompleted(state) => Some(GameSnapshot::from(state.clone())),
        ServerMessage::TimerUpdate(update) => current.map(|s| apply_timer(s, update)),
        ServerMessage::ScoreUpdate(update) => current.map(|s| apply_scores(s, update)),
        ServerMessage::CountryPainted(update) => current.map(|s| apply_painted(s, update)),
        _ => current,
    }
}

fn apply_timer(mut snapshot: GameSnapshot, update: &TimerUpdate) -> GameSnapshot {
    // Only FLAG rounds run a countdown; a stray timer tick for another mode
    // must not disturb the snapshot.
    if snapshot.game_mode != GameMode::Flag {
        return snapshot;
    }
    snapshot.time_remaining = Some(update.time_remaining);
    snapshot.deadline = update.deadline.or(snapshot.deadline);
    snapshot
}

fn apply_scores(mut snapshot: GameSnapshot, update: &ScoreUpdate) -> GameSnapshot {
    for (player, score) in &update.scores {
        snapshot.scores.insert(player.clone(), *score);
    }
    snapshot
}

fn apply_painted(mut snapshot: GameSnapshot, update: &CountryPainted) -> GameSnapshot {
    for (country, player) in &update.painted_countries {
        snapshot
            .painted_countries
            .insert(country.clone(), player.clone());
    }
    if let Some(colors) = &update.player_colors {
        for (player, color) in colors {
            snapshot.player_colors.insert(player.clone(), color.clone());
        }
    }
    snapshot
}
