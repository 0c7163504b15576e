//! Core protocol types for the WSJT-X wire format.
//!
//! Every type here travels "on the wire" in one of two shapes: as a binary
//! UDP frame exchanged with WSJT-X, or as the `data` object of a JSON
//! envelope exchanged with a browser. Field names in JSON follow the
//! upstream protocol names (`DXCall`, `SNR`, `TRPeriod`, ...), which is why
//! several fields carry an explicit `#[serde(rename)]`.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Sentinel that opens every frame.
pub const MAGIC: u32 = 0xADBC_CBDA;

/// Schema version 2. Always written by the encoder.
pub const SCHEMA_2: u32 = 2;

/// Schema version 3. Accepted on decode; same layout for the supported subset.
pub const SCHEMA_3: u32 = 3;

/// Length prefix marking a null string (decodes to `""`, never encoded).
pub const NULL_STRING_LEN: u32 = 0xFFFF_FFFF;

/// Sender id the bridge stamps on every frame it sends to WSJT-X.
pub const BRIDGE_SENDER_ID: &str = "WSJTX-WEB";

// ---------------------------------------------------------------------------
// MessageType — the registry of type tags
// ---------------------------------------------------------------------------

/// Every message type tag defined by the upstream protocol.
///
/// Knowing a tag does not mean the codec has a schema for it. Only
/// [`Heartbeat`], [`Status`] and [`Decode`] decode; only [`Heartbeat`],
/// [`Reply`] and [`HaltTx`] encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MessageType {
    Heartbeat = 0,
    Status = 1,
    Decode = 2,
    Clear = 3,
    Reply = 4,
    QsoLogged = 5,
    Close = 6,
    Replay = 7,
    HaltTx = 8,
    FreeText = 9,
    WsprDecode = 10,
    Location = 11,
    LoggedAdif = 12,
    HighlightCallsign = 13,
    SwitchConfiguration = 14,
    Configure = 15,
    AnnotationInfo = 16,
}

impl MessageType {
    /// Looks up a raw tag. Returns `None` for tags outside the protocol.
    pub fn from_u32(tag: u32) -> Option<Self> {
        let ty = match tag {
            0 => Self::Heartbeat,
            1 => Self::Status,
            2 => Self::Decode,
            3 => Self::Clear,
            4 => Self::Reply,
            5 => Self::QsoLogged,
            6 => Self::Close,
            7 => Self::Replay,
            8 => Self::HaltTx,
            9 => Self::FreeText,
            10 => Self::WsprDecode,
            11 => Self::Location,
            12 => Self::LoggedAdif,
            13 => Self::HighlightCallsign,
            14 => Self::SwitchConfiguration,
            15 => Self::Configure,
            16 => Self::AnnotationInfo,
            _ => return None,
        };
        Some(ty)
    }

    /// The numeric tag written on the wire.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Upstream name of the message type, for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Heartbeat => "Heartbeat",
            Self::Status => "Status",
            Self::Decode => "Decode",
            Self::Clear => "Clear",
            Self::Reply => "Reply",
            Self::QsoLogged => "QSOLogged",
            Self::Close => "Close",
            Self::Replay => "Replay",
            Self::HaltTx => "HaltTx",
            Self::FreeText => "FreeText",
            Self::WsprDecode => "WSPRDecode",
            Self::Location => "Location",
            Self::LoggedAdif => "LoggedADIF",
            Self::HighlightCallsign => "HighlightCallsign",
            Self::SwitchConfiguration => "SwitchConfiguration",
            Self::Configure => "Configure",
            Self::AnnotationInfo => "AnnotationInfo",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.as_u32())
    }
}

// ---------------------------------------------------------------------------
// FrameHeader
// ---------------------------------------------------------------------------

/// The fixed prefix of every frame, after the magic has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    /// Schema version announced by the sender. Carried, never branched on.
    pub schema: u32,
    /// Raw type tag.
    pub message_type: u32,
    /// Id of the application instance that sent the frame.
    pub sender_id: String,
}

// ---------------------------------------------------------------------------
// Message variants
// ---------------------------------------------------------------------------

/// Liveness announcement. Sent by WSJT-X periodically; the bridge can
/// encode one too.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Heartbeat {
    pub id: String,
    pub max_schema: u32,
    pub version: String,
    pub revision: String,
}

/// Snapshot of the radio and transmitter state. Inbound only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    pub id: String,
    /// Dial frequency in Hz.
    pub dial_frequency: u64,
    pub mode: String,
    #[serde(rename = "DXCall")]
    pub dx_call: String,
    pub report: String,
    pub tx_mode: String,
    pub tx_enabled: bool,
    pub transmitting: bool,
    pub decoding: bool,
    #[serde(rename = "RxDF")]
    pub rx_df: u32,
    #[serde(rename = "TxDF")]
    pub tx_df: u32,
    #[serde(rename = "DECall")]
    pub de_call: String,
    #[serde(rename = "DEGrid")]
    pub de_grid: String,
    #[serde(rename = "DXGrid")]
    pub dx_grid: String,
    pub tx_watchdog: bool,
    pub sub_mode: String,
    pub fast_mode: bool,
    pub special_op_mode: u8,
    pub frequency_tolerance: u32,
    #[serde(rename = "TRPeriod")]
    pub tr_period: u32,
    pub config_name: String,
    pub tx_message: String,
}

/// One decoded transmission. Inbound only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Decode {
    pub id: String,
    pub new: bool,
    /// Milliseconds since midnight UTC.
    pub time: u32,
    #[serde(rename = "SNR")]
    pub snr: i32,
    /// Seconds.
    pub delta_time: f64,
    /// Hz.
    pub delta_frequency: u32,
    pub mode: String,
    pub message: String,
    pub low_confidence: bool,
    pub off_air: bool,
}

/// Asks WSJT-X to answer a decode, as if the operator double-clicked it.
/// Outbound only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Reply {
    pub id: String,
    pub time: u32,
    #[serde(rename = "SNR")]
    pub snr: i32,
    pub delta_time: f64,
    #[serde(rename = "DeltaFrequency")]
    pub delta_freq: u32,
    pub mode: String,
    pub message: String,
    #[serde(rename = "LowConfidence")]
    pub low_conf: bool,
    /// Keyboard modifier bits held during the "click".
    pub modifiers: u8,
}

/// Stops transmission. Outbound only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HaltTx {
    pub id: String,
    /// Only disable auto-TX instead of halting immediately.
    pub auto_tx_only: bool,
}

// ---------------------------------------------------------------------------
// WireMessage
// ---------------------------------------------------------------------------

/// A message in the implemented subset of the protocol.
///
/// This is a closed sum type: the codec matches on it exhaustively, so
/// adding a variant forces every encode/decode path to handle it.
///
/// `#[serde(untagged)]` serializes just the inner struct. The type tag
/// travels separately in the [`EventEnvelope`](crate::EventEnvelope).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireMessage {
    Heartbeat(Heartbeat),
    Status(Status),
    Decode(Decode),
    Reply(Reply),
    HaltTx(HaltTx),
}

impl WireMessage {
    /// The type tag this variant is framed with.
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Heartbeat(_) => MessageType::Heartbeat,
            Self::Status(_) => MessageType::Status,
            Self::Decode(_) => MessageType::Decode,
            Self::Reply(_) => MessageType::Reply,
            Self::HaltTx(_) => MessageType::HaltTx,
        }
    }

    /// The sender id shared by every variant.
    pub fn sender_id(&self) -> &str {
        match self {
            Self::Heartbeat(m) => &m.id,
            Self::Status(m) => &m.id,
            Self::Decode(m) => &m.id,
            Self::Reply(m) => &m.id,
            Self::HaltTx(m) => &m.id,
        }
    }
}
