//! Client error types.

use thiserror::Error;

/// Errors surfaced by the session core.
///
/// Most runtime failures in this crate are deliberately *not* errors:
/// malformed frames are logged and dropped, and sends on a non-open socket
/// are logged no-ops. What remains are construction-time and transport
/// handshake failures.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured server URL could not be parsed.
    #[error("invalid server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The WebSocket handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    /// A send was attempted while the socket was not open.
    ///
    /// Never returned from [`crate::websocket::GameClient::send`] (which logs
    /// and drops instead); exists so the condition has a single printable
    /// representation.
    #[error("not connected to the game server")]
    NotConnected,
}
