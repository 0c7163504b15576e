//! JSON envelopes exchanged with browser clients.
//!
//! Both directions use the same outer shape, `{"type": ..., "data": ...}`,
//! but the tags differ:
//!
//! - Server → browser: `type` is the decimal message-type tag as a string
//!   (`"2"` for a decode), `data` is the message's fields.
//! - Browser → server: `type` is a command name (`"reply"` or `"halt"`),
//!   `data` is that command's parameters.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{HaltTx, Reply, WireMessage};
use crate::EnvelopeError;

// ---------------------------------------------------------------------------
// EventEnvelope — server to browser
// ---------------------------------------------------------------------------

/// A decoded WSJT-X message wrapped for broadcast.
///
/// Borrows the message: it only exists long enough to be serialized once
/// and fanned out as text.
#[derive(Debug, Serialize)]
pub struct EventEnvelope<'a> {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: &'a WireMessage,
}

impl<'a> EventEnvelope<'a> {
    /// Wraps a message, tagging it with its numeric type.
    pub fn new(message: &'a WireMessage) -> Self {
        Self {
            kind: message.message_type().as_u32().to_string(),
            data: message,
        }
    }

    /// Serializes the envelope to a JSON text frame.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::Encode)
    }
}

// ---------------------------------------------------------------------------
// Commands — browser to server
// ---------------------------------------------------------------------------

/// Parameters of a `"reply"` command. Absent fields default to zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ReplyCommand {
    pub time: u32,
    #[serde(rename = "SNR")]
    pub snr: i32,
    pub delta_time: f64,
    pub delta_frequency: u32,
    pub mode: String,
    pub message: String,
    pub low_confidence: bool,
    pub modifiers: u8,
}

/// Parameters of a `"halt"` command.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct HaltCommand {
    pub auto_tx_only: bool,
}

/// A command issued by a browser.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Reply(ReplyCommand),
    Halt(HaltCommand),
}

/// Envelope keys, in their canonical spelling.
const COMMAND_KEYS: &[&str] = &["type", "data"];

const REPLY_KEYS: &[&str] = &[
    "Time",
    "SNR",
    "DeltaTime",
    "DeltaFrequency",
    "Mode",
    "Message",
    "LowConfidence",
    "Modifiers",
];

const HALT_KEYS: &[&str] = &["AutoTxOnly"];

/// The outer envelope, before the tag is inspected.
///
/// Parsing happens in two stages so that malformed JSON and an unknown
/// `type` surface as different errors.
#[derive(Deserialize)]
struct RawCommand {
    #[serde(rename = "type")]
    kind: String,
    /// `None` when the key is absent, `Some(Null)` for `"data": null`.
    #[serde(default, deserialize_with = "present")]
    data: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(d).map(Some)
}

/// Rewrites object keys matching one of `names` (ignoring ASCII case) to
/// that canonical spelling. Browsers are not held to exact key case.
fn fold_keys(value: Value, names: &[&str]) -> Value {
    let Value::Object(map) = value else {
        return value;
    };
    let folded: Map<String, Value> = map
        .into_iter()
        .map(|(key, v)| {
            let key = names
                .iter()
                .find(|name| name.eq_ignore_ascii_case(&key))
                .map_or(key, |name| (*name).to_string());
            (key, v)
        })
        .collect();
    Value::Object(folded)
}

/// Parses a command payload. `null` means "all defaults".
fn payload<T: DeserializeOwned + Default>(
    data: Option<Value>,
    names: &[&str],
) -> Result<T, EnvelopeError> {
    match data {
        None => Err(EnvelopeError::Parse(serde_json::Error::missing_field(
            "data",
        ))),
        Some(Value::Null) => Ok(T::default()),
        Some(data) => serde_json::from_value(fold_keys(data, names))
            .map_err(EnvelopeError::Parse),
    }
}

impl Command {
    /// Parses a command frame from a browser.
    ///
    /// Keys are matched without regard to case, and `"data": null` yields
    /// a command with every parameter at its default.
    ///
    /// # Errors
    /// - [`EnvelopeError::Parse`] for malformed JSON, a missing `data`, or
    ///   a payload of the wrong shape
    /// - [`EnvelopeError::UnsupportedCommand`] for an unknown `type`
    pub fn parse(data: &[u8]) -> Result<Self, EnvelopeError> {
        let value: Value =
            serde_json::from_slice(data).map_err(EnvelopeError::Parse)?;
        let raw: RawCommand =
            serde_json::from_value(fold_keys(value, COMMAND_KEYS))
                .map_err(EnvelopeError::Parse)?;
        match raw.kind.as_str() {
            "reply" => payload(raw.data, REPLY_KEYS).map(Self::Reply),
            "halt" => payload(raw.data, HALT_KEYS).map(Self::Halt),
            _ => Err(EnvelopeError::UnsupportedCommand(raw.kind)),
        }
    }

    /// The command's wire name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reply(_) => "reply",
            Self::Halt(_) => "halt",
        }
    }

    /// Builds the outbound message, stamped with `sender_id`.
    ///
    /// The browser never chooses the sender id; the bridge always
    /// identifies itself.
    pub fn into_wire_message(self, sender_id: &str) -> WireMessage {
        let id = sender_id.to_string();
        match self {
            Self::Reply(c) => WireMessage::Reply(Reply {
                id,
                time: c.time,
                snr: c.snr,
                delta_time: c.delta_time,
                delta_freq: c.delta_frequency,
                mode: c.mode,
                message: c.message,
                low_conf: c.low_confidence,
                modifiers: c.modifiers,
            }),
            Self::Halt(c) => WireMessage::HaltTx(HaltTx {
                id,
                auto_tx_only: c.auto_tx_only,
            }),
        }
    }
}
