//! Transport layer for the WSJT-X web bridge.
//!
//! Two very different sockets feed the bridge:
//!
//! - a UDP socket ([`UdpEndpoint`]) talking to WSJT-X, one frame per
//!   datagram;
//! - WebSocket connections ([`WebSocketConnection`]) to browsers, each
//!   behind the [`Connection`] trait so the router can be tested without
//!   a network.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod udp;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use udp::{UdpEndpoint, DEFAULT_MAX_DATAGRAM};
#[cfg(feature = "websocket")]
pub use websocket::{PendingUpgrade, WebSocketConnection, WebSocketListener};

use std::fmt;

/// Opaque identifier for a browser connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
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

/// A single browser connection that exchanges text frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends a text frame to the browser.
    async fn send(&self, text: &str) -> Result<(), Self::Error>;

    /// Receives the next data frame from the browser.
    ///
    /// Text and binary frames are both returned as bytes. Returns
    /// `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
