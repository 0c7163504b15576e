//! `BridgeServer` builder and run loops.
//!
//! This is the entry point for running the bridge. It binds both sockets
//! and then drives two kinds of worker concurrently:
//!
//! - one UDP loop reading datagrams from WSJT-X;
//! - one task per browser connection that finishes the upgrade and then
//!   reads WebSocket frames.
//!
//! They meet only in the shared [`BridgeRouter`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use wsjtx_transport::{
    Connection, PendingUpgrade, UdpEndpoint, WebSocketConnection,
    WebSocketListener,
};

use crate::handler::handle_connection;
use crate::router::BridgeRouter;
use crate::{BridgeConfig, BridgeError};

/// Builder for configuring and starting the bridge.
///
/// # Example
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), wsjtx_bridge::BridgeError> {
/// use wsjtx_bridge::BridgeServer;
///
/// let server = BridgeServer::builder()
///     .udp_bind("0.0.0.0:2237")
///     .ws_bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BridgeServerBuilder {
    config: BridgeConfig,
}

impl BridgeServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the UDP address to listen for WSJT-X on.
    pub fn udp_bind(mut self, addr: &str) -> Self {
        self.config.udp_bind = addr.to_string();
        self
    }

    /// Sets the TCP address to accept browser connections on.
    pub fn ws_bind(mut self, addr: &str) -> Self {
        self.config.ws_bind = addr.to_string();
        self
    }

    /// Sets the request path that is upgraded to a WebSocket.
    pub fn ws_path(mut self, path: &str) -> Self {
        self.config.ws_path = path.to_string();
        self
    }

    /// Sets the receive buffer size for each datagram.
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.config.max_datagram_size = size;
        self
    }

    /// Sets how long a browser may take to finish its WebSocket upgrade.
    pub fn handshake_timeout(mut self, limit: Duration) -> Self {
        self.config.handshake_timeout = limit;
        self
    }

    /// Binds both sockets and returns a server ready to [`run`](BridgeServer::run).
    pub async fn build(self) -> Result<BridgeServer, BridgeError> {
        let udp = UdpEndpoint::bind(&self.config.udp_bind)
            .await?
            .with_max_datagram(self.config.max_datagram_size);
        let udp = Arc::new(udp);

        let listener =
            WebSocketListener::bind(&self.config.ws_bind, &self.config.ws_path)
                .await?;

        let router = Arc::new(BridgeRouter::new(Arc::clone(&udp)));

        Ok(BridgeServer {
            udp,
            listener,
            router,
            handshake_timeout: self.config.handshake_timeout,
        })
    }
}

/// A bound bridge. Call [`run()`](Self::run) to start serving.
pub struct BridgeServer {
    udp: Arc<UdpEndpoint>,
    listener: WebSocketListener,
    router: Arc<BridgeRouter<WebSocketConnection>>,
    handshake_timeout: Duration,
}

impl BridgeServer {
    /// Creates a new builder.
    pub fn builder() -> BridgeServerBuilder {
        BridgeServerBuilder::new()
    }

    /// The UDP address WSJT-X should send to.
    pub fn udp_local_addr(&self) -> std::io::Result<SocketAddr> {
        self.udp.local_addr()
    }

    /// The TCP address browsers connect to.
    pub fn ws_local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// The shared router, for inspecting sessions and the current peer.
    pub fn router(&self) -> Arc<BridgeRouter<WebSocketConnection>> {
        Arc::clone(&self.router)
    }

    /// Runs the UDP loop and the WebSocket accept loop.
    ///
    /// Runs until the process is terminated. There is no graceful drain.
    pub async fn run(self) -> Result<(), BridgeError> {
        tracing::info!("WSJT-X bridge running");

        tokio::spawn(run_udp_loop(
            Arc::clone(&self.router),
            Arc::clone(&self.udp),
        ));

        loop {
            match self.listener.accept().await {
                Ok(pending) => {
                    tokio::spawn(upgrade_and_serve(
                        pending,
                        self.handshake_timeout,
                        Arc::clone(&self.router),
                    ));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Finishes one browser's upgrade off the accept loop, then serves it.
async fn upgrade_and_serve(
    pending: PendingUpgrade,
    limit: Duration,
    router: Arc<BridgeRouter<WebSocketConnection>>,
) {
    let addr = pending.peer_addr();
    match pending.upgrade(limit).await {
        Ok(conn) => {
            tracing::debug!(conn_id = %conn.id(), %addr, "browser upgraded");
            handle_connection(conn, router).await;
        }
        Err(e) => {
            tracing::debug!(%addr, error = %e, "upgrade failed");
        }
    }
}

/// Reads datagrams forever, handing each to the router.
async fn run_udp_loop(
    router: Arc<BridgeRouter<WebSocketConnection>>,
    udp: Arc<UdpEndpoint>,
) {
    loop {
        let (data, from) = match udp.recv_from().await {
            Ok(datagram) => datagram,
            Err(e) => {
                tracing::warn!(error = %e, "UDP receive failed");
                continue;
            }
        };

        if let Err(e) = router.handle_datagram(&data, from).await {
            tracing::debug!(%from, len = data.len(), error = %e, "datagram dropped");
        }
    }
}
