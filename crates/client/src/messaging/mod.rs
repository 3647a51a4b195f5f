//! Connection state observation and the typed notice channel.

mod connection;
mod event_bus;
mod notices;

pub use connection::{ConnectionState, ConnectionStateObserver};
pub(crate) use connection::set_connection_state;
pub use event_bus::EventBus;
pub use notices::SessionNotice;
