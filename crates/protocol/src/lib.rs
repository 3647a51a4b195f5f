//! GeoClash Protocol - Shared wire types for server and client communication
//!
//! This crate contains every type that crosses the WebSocket boundary:
//! - The `{type, payload}` message envelopes ([`ServerMessage`], [`ClientMessage`])
//! - The value objects they carry (game state, roster, question, modes)
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json and chrono
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Tolerant reader** - Unknown message types and absent optional fields
//!    deserialize without error; the server may evolve ahead of the client

pub mod messages;
pub mod types;

// =============================================================================
// WebSocket Message Types
// =============================================================================
pub use messages::{
    AnswerSubmitted, ChatBroadcast, ClientMessage, ColorRejected, CountryPainted, MessageReaction,
    RoomNotice, ScoreUpdate, ServerMessage, SessionCollision, TimerUpdate,
};

// =============================================================================
// Shared Types
// =============================================================================
pub use types::{GameMode, GameState, GameStatus, MapPlayMode, Question, RoomType, RoomUpdate};
