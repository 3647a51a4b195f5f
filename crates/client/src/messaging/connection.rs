//! Connection lifecycle management.
//!
//! Connection state is driven solely by socket lifecycle events; UI intent
//! (wanting to connect) never writes it directly. The state lives in an
//! `AtomicU8` so any number of observers can read it without locking.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Connection state for the game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection attempt has been made yet
    Idle,
    /// Attempting to establish the connection
    Connecting,
    /// Socket is open and usable
    Open,
    /// Socket closed (error, server close, or explicit disconnect)
    Closed,
}

impl ConnectionState {
    /// Convert to u8 for atomic storage.
    pub fn to_u8(self) -> u8 {
        match self {
            ConnectionState::Idle => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Open => 2,
            ConnectionState::Closed => 3,
        }
    }

    /// Convert from u8 (atomic storage).
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::Closed,
            _ => ConnectionState::Idle,
        }
    }
}

/// Observable connection state for UI binding.
///
/// Multiple observers can share the same underlying state without owning
/// the client that drives it.
#[derive(Clone)]
pub struct ConnectionStateObserver {
    state: Arc<AtomicU8>,
}

impl ConnectionStateObserver {
    pub fn new(state: Arc<AtomicU8>) -> Self {
        Self { state }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Check if the socket is currently open.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

/// Internal helper to update connection state (used by the socket owner).
pub(crate) fn set_connection_state(state_ref: &AtomicU8, new_state: ConnectionState) {
    state_ref.store(new_state.to_u8(), Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_roundtrip() {
        let states = [
            ConnectionState::Idle,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closed,
        ];

        for state in states {
            let u8_val = state.to_u8();
            let back = ConnectionState::from_u8(u8_val);
            assert_eq!(state, back);
        }
    }

    #[test]
    fn test_observer_reads_state() {
        let state = Arc::new(AtomicU8::new(ConnectionState::Idle.to_u8()));
        let observer = ConnectionStateObserver::new(Arc::clone(&state));

        assert_eq!(observer.state(), ConnectionState::Idle);
        assert!(!observer.is_open());

        set_connection_state(&state, ConnectionState::Open);

        assert_eq!(observer.state(), ConnectionState::Open);
        assert!(observer.is_open());
    }
}
