//! The bridge router: the one place where UDP and WebSocket traffic meet.
//!
//! The router owns two pieces of shared state:
//!
//! - **the peer** — the address of the WSJT-X instance we heard from most
//!   recently. Last write wins; no history is kept. Commands go there.
//! - **the session set** — every connected browser. Decoded frames are
//!   broadcast to all of them.
//!
//! Both are behind a tokio `Mutex`. Message rates are a few per second,
//! so contention is not a concern. The UDP loop and every session
//! handler get the same router through an `Arc`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Mutex;
use wsjtx_protocol::{
    decode_frame, encode, Command, EventEnvelope, WireMessage,
    BRIDGE_SENDER_ID,
};
use wsjtx_transport::{Connection, ConnectionId, UdpEndpoint};

use crate::BridgeError;

/// Routes decoded WSJT-X frames to browsers and browser commands back to
/// WSJT-X.
pub struct BridgeRouter<C: Connection> {
    sessions: Mutex<HashMap<ConnectionId, Arc<C>>>,
    peer: Mutex<Option<SocketAddr>>,
    udp: Arc<UdpEndpoint>,
}

impl<C: Connection> BridgeRouter<C> {
    /// Creates a router that sends commands through `udp`.
    pub fn new(udp: Arc<UdpEndpoint>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            peer: Mutex::new(None),
            udp,
        }
    }

    // -----------------------------------------------------------------
    // Session set
    // -----------------------------------------------------------------

    /// Adds a browser session. It receives every broadcast from now on.
    pub async fn register(&self, conn: Arc<C>) {
        let id = conn.id();
        let count = {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(id, conn);
            sessions.len()
        };
        tracing::info!(conn_id = %id, sessions = count, "browser connected");
    }

    /// Removes a browser session. Returns `false` if it was already gone
    /// (e.g. dropped by a failed broadcast write).
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.sessions.lock().await.remove(&id).is_some();
        if removed {
            tracing::info!(conn_id = %id, "browser disconnected");
        }
        removed
    }

    /// Number of connected browser sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// The most recently seen WSJT-X address, if any.
    pub async fn peer(&self) -> Option<SocketAddr> {
        *self.peer.lock().await
    }

    // -----------------------------------------------------------------
    // UDP → browsers
    // -----------------------------------------------------------------

    /// Handles one inbound datagram from `from`.
    ///
    /// The sender becomes the peer before decoding is attempted, so even a
    /// frame we can't parse tells us where WSJT-X lives. On success the
    /// message is broadcast as `{"type": "<tag>", "data": {...}}` and the
    /// number of sessions reached is returned.
    ///
    /// # Errors
    /// Any decode failure. The datagram is dropped and nothing is sent to
    /// browsers.
    pub async fn handle_datagram(
        &self,
        data: &[u8],
        from: SocketAddr,
    ) -> Result<usize, BridgeError> {
        *self.peer.lock().await = Some(from);

        let frame = decode_frame(data)?;
        tracing::trace!(
            %from,
            schema = frame.header.schema,
            message_type = frame.header.message_type,
            sender_id = %frame.header.sender_id,
            "frame decoded"
        );
        if let WireMessage::Decode(d) = &frame.message {
            tracing::debug!(
                mode = %d.mode,
                message = %d.message,
                snr = d.snr,
                time = d.time,
                "decode"
            );
        }

        let text = EventEnvelope::new(&frame.message).to_json()?;
        Ok(self.broadcast(&text).await)
    }

    /// Sends `text` to every session. Returns how many writes succeeded.
    ///
    /// The session lock is held for the whole fan-out, so membership can't
    /// change mid-broadcast and broadcasts don't interleave. A session
    /// whose write fails is removed and closed; the others still get the
    /// message.
    pub async fn broadcast(&self, text: &str) -> usize {
        let mut sessions = self.sessions.lock().await;

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, conn) in sessions.iter() {
            match conn.send(text).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(conn_id = %id, error = %e, "broadcast write failed");
                    failed.push(*id);
                }
            }
        }

        for id in failed {
            if let Some(conn) = sessions.remove(&id) {
                tracing::info!(conn_id = %id, "dropping browser after write failure");
                if let Err(e) = conn.close().await {
                    tracing::debug!(conn_id = %id, error = %e, "close after write failure failed");
                }
            }
        }

        delivered
    }

    // -----------------------------------------------------------------
    // Browsers → UDP
    // -----------------------------------------------------------------

    /// Handles one command frame from a browser.
    ///
    /// The command is stamped with the bridge's own sender id, encoded and
    /// sent to the current peer. Returns the address it was sent to.
    ///
    /// # Errors
    /// - [`BridgeError::Envelope`] for malformed or unknown commands
    /// - [`BridgeError::NoPeer`] if WSJT-X hasn't been heard from yet
    /// - [`BridgeError::Transport`] if the UDP send fails
    pub async fn handle_command(
        &self,
        data: &[u8],
    ) -> Result<SocketAddr, BridgeError> {
        let cmd = Command::parse(data)?;
        let kind = cmd.kind();

        let target = self.peer().await.ok_or(BridgeError::NoPeer)?;

        let bytes = encode(&cmd.into_wire_message(BRIDGE_SENDER_ID))?;
        self.udp.send_to(&bytes, target).await?;

        tracing::info!(command = kind, %target, "command sent");
        Ok(target)
    }
}
