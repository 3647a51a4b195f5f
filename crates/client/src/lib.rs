//! GeoClash Client - realtime session core
//!
//! Everything a game view needs between "mount" and "unmount":
//!
//! - `session`: per-tab identity and persisted room footprint
//! - `websocket`: one socket per view, URL construction, guarded sends
//! - `router` + `snapshot` + `chat`: inbound frames reconciled into the
//!   client-visible game state and chat stream
//! - `recovery`: duplicate-session vs. reload-reconnect classification
//! - `throttle`: sliding-window chat abuse limiter
//! - `runtime`: composition root with complete teardown
//!
//! Rendering, audio and navigation stay outside; they consume this crate's
//! watches and notices. The authoritative game rules live on the server and
//! are opaque here.

pub mod chat;
pub mod error;
pub mod messaging;
pub mod ports;
pub mod recovery;
pub mod router;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod throttle;
pub mod websocket;

pub use chat::{ChatLog, ChatMessageRecord};
pub use error::ClientError;
pub use messaging::{ConnectionState, ConnectionStateObserver, EventBus, SessionNotice};
pub use ports::{StorageProvider, SystemClock, TimeProvider};
pub use recovery::{RecoveryDetector, RecoveryState, RECONNECT_SETTLE_MS};
pub use router::MessageRouter;
pub use runtime::{GameConfig, GameRuntime};
pub use session::{generate_room_code, RoomFootprint, SessionIdentity, SessionStore};
pub use snapshot::{merge, GameSnapshot};
pub use throttle::{ChatThrottle, SendDecision};
pub use websocket::{
    ClientMessageBuilder, ConnectParams, GameClient, DEFAULT_ROUNDS, DEFAULT_ROUND_TIMEOUT_SECS,
};
