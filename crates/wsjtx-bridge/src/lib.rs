//! # WSJT-X web bridge
//!
//! Relays WSJT-X's binary UDP protocol to browsers over WebSocket, and
//! browser commands back to WSJT-X.
//!
//! ```text
//! WSJT-X ──UDP──▶ decode ──▶ BridgeRouter ──JSON──▶ every browser
//! WSJT-X ◀──UDP── encode ◀── BridgeRouter ◀──JSON── one browser
//! ```
//!
//! Only one WSJT-X instance is tracked at a time: whichever sent the most
//! recent datagram. Commands issued before any datagram has arrived are
//! dropped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), wsjtx_bridge::BridgeError> {
//! let server = wsjtx_bridge::BridgeServer::builder().build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod router;
mod server;

pub use config::{BridgeConfig, DEFAULT_HANDSHAKE_TIMEOUT};
pub use error::BridgeError;
pub use router::BridgeRouter;
pub use server::{BridgeServer, BridgeServerBuilder};
