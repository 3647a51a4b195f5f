//! WebSocket connection management.
//!
//! - `url`: connection URL construction from session + room parameters
//! - `client`: the socket owner (connect / send / disconnect)
//! - `outbound`: centralized `ClientMessage` construction

mod client;
mod outbound;
mod url;

pub use client::GameClient;
pub use outbound::ClientMessageBuilder;
pub use url::{ConnectParams, DEFAULT_ROUNDS, DEFAULT_ROUND_TIMEOUT_SECS};
