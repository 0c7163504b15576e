//! Error types for the protocol layer.
//!
//! Binary framing and JSON envelopes fail in different ways, so each gets
//! its own enum. Both are handled where they happen: the offending
//! datagram or command is dropped and the bridge keeps running.

/// Errors produced while decoding or encoding a binary WSJT-X frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The first four bytes are not the protocol sentinel.
    ///
    /// Nothing past the magic is looked at; the frame is unparseable.
    #[error("bad magic number: {0:#010x}")]
    BadMagic(u32),

    /// The buffer ended inside a declared field.
    ///
    /// `field` names what was being read, e.g. `"sender id"` or
    /// `"DeltaTime"`. No partially populated message is ever returned.
    #[error("truncated frame while reading {field}")]
    Truncated { field: &'static str },

    /// The type tag has no schema in this implementation (decode), or the
    /// variant is not one the bridge sends (encode).
    #[error("unsupported message type: {0}")]
    UnsupportedType(u32),

    /// A string is too long for a 32-bit length prefix.
    #[error("string of {0} bytes does not fit a length prefix")]
    StringTooLong(usize),
}

/// Errors produced while handling browser JSON envelopes.
#[cfg(feature = "json")]
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// Serializing an outbound event failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The command was not valid JSON, or its payload had the wrong shape.
    #[error("command parse failed: {0}")]
    Parse(#[source] serde_json::Error),

    /// The command's `type` is not one the bridge understands.
    #[error("unsupported command type: {0:?}")]
    UnsupportedCommand(String),
}
