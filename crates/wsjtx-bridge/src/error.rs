//! Unified error type for the bridge.

use wsjtx_protocol::{EnvelopeError, WireError};
use wsjtx_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Every unit of work the bridge does (one datagram, one command, one
/// broadcast write) returns this on failure. The loop that owns the unit
/// logs it and moves on; nothing here ever stops the process.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A binary frame could not be decoded or encoded.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// A browser command or outbound event could not be (de)serialized.
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// A socket operation failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A command arrived before any WSJT-X instance was heard from.
    #[error("no WSJT-X instance seen yet")]
    NoPeer,
}
