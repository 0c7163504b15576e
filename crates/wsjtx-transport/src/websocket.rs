//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Listens for browser connections and upgrades those that ask for the
/// bridge's endpoint path.
pub struct WebSocketListener {
    listener: TcpListener,
    path: String,
}

impl WebSocketListener {
    /// Binds a listener. Only upgrade requests for `path` are accepted.
    pub async fn bind(addr: &str, path: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            }
        })?;
        tracing::info!(addr, path, "WebSocket listener bound");
        Ok(Self {
            listener,
            path: path.to_string(),
        })
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next TCP connection.
    ///
    /// Only the TCP accept happens here. The HTTP upgrade is left to
    /// [`PendingUpgrade::upgrade`] so a slow or silent client cannot hold
    /// up the accept loop.
    pub async fn accept(&self) -> Result<PendingUpgrade, TransportError> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        Ok(PendingUpgrade {
            stream,
            addr,
            path: self.path.clone(),
        })
    }
}

/// An accepted TCP connection that has not been upgraded yet.
pub struct PendingUpgrade {
    stream: TcpStream,
    addr: SocketAddr,
    path: String,
}

impl PendingUpgrade {
    /// Returns the client's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Completes the WebSocket handshake within `limit`.
    ///
    /// Requests for any other path are answered with `404 Not Found` and
    /// reported as [`TransportError::AcceptFailed`]. A client that has not
    /// finished its handshake in time gets
    /// [`TransportError::HandshakeTimeout`] and its socket is dropped.
    pub async fn upgrade(
        self,
        limit: Duration,
    ) -> Result<WebSocketConnection, TransportError> {
        let Self { stream, addr, path } = self;
        let check_path = move |req: &Request, resp: Response| {
            if req.uri().path() == path {
                Ok(resp)
            } else {
                let mut err: ErrorResponse =
                    ErrorResponse::new(Some("not found".to_string()));
                *err.status_mut() = StatusCode::NOT_FOUND;
                Err(err)
            }
        };

        let ws = tokio::time::timeout(
            limit,
            tokio_tungstenite::accept_hdr_async(stream, check_path),
        )
        .await
        .map_err(|_| TransportError::HandshakeTimeout(limit))?
        .map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        // Split so a broadcast never waits behind a pending read.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            addr,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// A single browser WebSocket connection.
pub struct WebSocketConnection {
    id: ConnectionId,
    addr: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    /// Returns the browser's address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, text: &str) -> Result<(), Self::Error> {
        let msg = Message::text(text.to_owned());
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
