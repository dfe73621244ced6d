//! Transport abstraction layer for Parlor.
//!
//! A [`Transport`] accepts [`Connection`]s. A connection is split into
//! independently owned halves right after accept: the gateway keeps the
//! [`ConnectionReader`] in the connection task and moves the
//! [`ConnectionWriter`] into a dedicated writer task, so room actors can
//! push frames to a player while that player's reader is parked waiting
//! for input.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketReader, WebSocketTransport, WebSocketWriter};

use std::fmt;
use std::net::SocketAddr;

/// Opaque, process-unique identifier for a connection.
///
/// Ids are handed out from a monotonically increasing counter and never
/// reused, so an id that disconnected will never reappear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The address the transport is listening on.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// A freshly accepted connection, before it is split.
pub trait Connection: Send + 'static {
    /// Read half.
    type Reader: ConnectionReader;
    /// Write half.
    type Writer: ConnectionWriter;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the remote peer's address.
    fn peer_addr(&self) -> SocketAddr;

    /// Splits the connection into halves that can live in different tasks.
    fn into_split(self) -> (Self::Reader, Self::Writer);
}

/// The receiving half of a connection.
pub trait ConnectionReader: Send + 'static {
    /// The error type for read operations.
    type Error: std::error::Error + Send + Sync;

    /// Receives the next message from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Self::Error>;
}

/// The sending half of a connection.
pub trait ConnectionWriter: Send + 'static {
    /// The error type for write operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one message to the remote peer.
    async fn send(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Closes the connection.
    async fn close(&mut self) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }
}
