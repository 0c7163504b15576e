//! Bridge configuration.

use std::time::Duration;

use wsjtx_transport::DEFAULT_MAX_DATAGRAM;

/// Default time a browser gets to finish its WebSocket upgrade.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the bridge listens and how it reads datagrams.
///
/// Construct with `BridgeConfig::default()` and override the fields you
/// need, or go through [`BridgeServerBuilder`](crate::BridgeServerBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// UDP address WSJT-X sends to. Default: `0.0.0.0:2237`.
    pub udp_bind: String,

    /// TCP address for browser WebSocket connections. Default: `0.0.0.0:8080`.
    pub ws_bind: String,

    /// Request path upgraded to a WebSocket. Default: `/ws`.
    pub ws_path: String,

    /// Receive buffer per datagram, in bytes. Default: 4096.
    pub max_datagram_size: usize,

    /// Time allowed for a browser's upgrade handshake. Default: 10s.
    pub handshake_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            udp_bind: "0.0.0.0:2237".to_string(),
            ws_bind: "0.0.0.0:8080".to_string(),
            ws_path: "/ws".to_string(),
            max_datagram_size: DEFAULT_MAX_DATAGRAM,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}
