//! UDP endpoint for talking to WSJT-X.
//!
//! WSJT-X sends each protocol frame as one datagram, so the endpoint hands
//! out whole datagrams and never buffers across them.

use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::TransportError;

/// Default receive buffer size. Large enough for any Status frame.
pub const DEFAULT_MAX_DATAGRAM: usize = 4096;

/// A bound UDP socket shared by the receive loop and command senders.
///
/// All methods take `&self`; tokio's `UdpSocket` allows concurrent
/// `recv_from` and `send_to`, so the endpoint can sit in an `Arc` without
/// a lock.
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: UdpSocket,
    max_datagram: usize,
}

impl UdpEndpoint {
    /// Binds a UDP socket on `addr`.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await.map_err(|source| {
            TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(addr, "listening for WSJT-X");
        Ok(Self {
            socket,
            max_datagram: DEFAULT_MAX_DATAGRAM,
        })
    }

    /// Sets the receive buffer size. Longer datagrams are cut short by the
    /// OS, which the codec then reports as truncated.
    pub fn with_max_datagram(mut self, size: usize) -> Self {
        self.max_datagram = size.max(1);
        self
    }

    /// Returns the local address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Waits for the next datagram. Returns its payload and sender.
    pub async fn recv_from(
        &self,
    ) -> Result<(Vec<u8>, SocketAddr), TransportError> {
        let mut buf = vec![0u8; self.max_datagram];
        let (n, from) = self
            .socket
            .recv_from(&mut buf)
            .await
            .map_err(TransportError::ReceiveFailed)?;
        buf.truncate(n);
        Ok((buf, from))
    }

    /// Sends one datagram to `to`.
    pub async fn send_to(
        &self,
        data: &[u8],
        to: SocketAddr,
    ) -> Result<(), TransportError> {
        self.socket
            .send_to(data, to)
            .await
            .map_err(TransportError::SendFailed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_send_and_receive() {
        let a = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();
        let b = UdpEndpoint::bind("127.0.0.1:0").await.unwrap();

        a.send_to(b"frame", b.local_addr().unwrap()).await.unwrap();

        let (data, from) = b.recv_from().await.unwrap();
        assert_eq!(data, b"frame");
        assert_eq!(from, a.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_udp_bind_failure_names_address() {
        let err = UdpEndpoint::bind("not-an-address").await.unwrap_err();
        assert!(matches!(err, TransportError::BindFailed { .. }));
        assert!(err.to_string().contains("not-an-address"));
    }
}
