//! Wire protocol for the WSJT-X web bridge.
//!
//! This crate defines both "languages" the bridge speaks:
//!
//! - **Types** ([`WireMessage`], [`MessageType`], [`FrameHeader`]) — the
//!   messages WSJT-X exchanges over UDP.
//! - **Codec** ([`decode`], [`encode`]) — the binary framing: a magic
//!   sentinel, a schema version, a type tag, a sender id, then the
//!   per-type fields, all big-endian with no padding.
//! - **Envelopes** ([`EventEnvelope`], [`Command`]) — the tagged JSON that
//!   travels to and from browser clients.
//! - **Errors** ([`WireError`], [`EnvelopeError`]) — what can go wrong.
//!
//! # Architecture
//!
//! The protocol layer is pure: no sockets, no tasks, no state. It sits
//! between the transports (raw bytes) and the bridge router.
//!
//! ```text
//! UDP datagram → decode → WireMessage → EventEnvelope → WebSocket
//! WebSocket → Command → WireMessage → encode → UDP datagram
//! ```

mod codec;
#[cfg(feature = "json")]
mod envelope;
mod error;
mod types;

pub use codec::{decode, decode_frame, encode, Frame};
#[cfg(feature = "json")]
pub use envelope::{Command, EventEnvelope, HaltCommand, ReplyCommand};
#[cfg(feature = "json")]
pub use error::EnvelopeError;
pub use error::WireError;
pub use types::{
    Decode, FrameHeader, HaltTx, Heartbeat, MessageType, Reply, Status,
    WireMessage, BRIDGE_SENDER_ID, MAGIC, NULL_STRING_LEN, SCHEMA_2,
    SCHEMA_3,
};
