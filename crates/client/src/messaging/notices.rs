//! Side-channel session notices.
//!
//! A closed enum dispatched over the typed [`super::EventBus`]. Notices carry
//! server messages that do not merge into the game snapshot but still need to
//! reach the view layer, plus the session's own leave signal.

use serde::{Deserialize, Serialize};

use geoclash_protocol::{AnswerSubmitted, RoomUpdate};

/// Session-level notifications published to subscribers.
///
/// Serializable so hosts that bridge notices across a boundary (devtools,
/// WASM shims) can carry them as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionNotice {
    /// Room roster or settings changed.
    RoomUpdate(RoomUpdate),
    /// A player's answer was judged (drives banners, not the snapshot).
    AnswerSubmitted(AnswerSubmitted),
    /// Another connection claims this session; a human must resolve it.
    SessionCollision { message: String },
    /// The owner closed the room; persisted room state has been cleared.
    RoomClosed { message: Option<String> },
    /// The room expired server-side; persisted room state has been cleared.
    RoomExpired,
    /// The chosen color was rejected; re-prompt the color picker.
    ColorRejected {
        color: Option<String>,
        error: Option<String>,
    },
    /// This tab relinquished the room (explicit leave or collision exit).
    LeaveRoom,
}
