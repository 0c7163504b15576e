//! Binary codec for WSJT-X UDP frames.
//!
//! A frame is a header followed by the fields of one message, all
//! big-endian with no padding:
//!
//! ```text
//! magic: u32 | schema: u32 | type: u32 | sender id: string | fields...
//! ```
//!
//! Strings use the Qt `QByteArray` convention: a `u32` length prefix
//! followed by that many raw bytes. A prefix of `0xFFFFFFFF` is a null
//! string, which we surface as `""`. Booleans are a single byte.
//!
//! UDP datagrams are atomic, so the codec works on one complete buffer at a
//! time. Any short read aborts the whole frame.

use bytes::{Buf, BufMut, BytesMut};

use crate::types::{
    Decode, FrameHeader, Heartbeat, Status, WireMessage, MAGIC,
    NULL_STRING_LEN, SCHEMA_2,
};
use crate::{MessageType, WireError};

/// A decoded frame: the header plus the typed message.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: FrameHeader,
    pub message: WireMessage,
}

/// Decodes one datagram into a typed message.
///
/// # Errors
/// - [`WireError::BadMagic`] if the sentinel is wrong
/// - [`WireError::Truncated`] if the buffer ends inside a field
/// - [`WireError::UnsupportedType`] if the tag has no schema here
pub fn decode(data: &[u8]) -> Result<WireMessage, WireError> {
    decode_frame(data).map(|frame| frame.message)
}

/// Decodes one datagram, keeping the header alongside the message.
pub fn decode_frame(data: &[u8]) -> Result<Frame, WireError> {
    let mut r = Reader::new(data);

    let magic = r.u32("magic")?;
    if magic != MAGIC {
        return Err(WireError::BadMagic(magic));
    }
    let schema = r.u32("schema")?;
    let message_type = r.u32("message type")?;
    let sender_id = r.string("sender id")?;

    let id = sender_id.clone();
    let message = match MessageType::from_u32(message_type) {
        Some(MessageType::Heartbeat) => {
            WireMessage::Heartbeat(read_heartbeat(&mut r, id)?)
        }
        Some(MessageType::Status) => {
            WireMessage::Status(read_status(&mut r, id)?)
        }
        Some(MessageType::Decode) => {
            WireMessage::Decode(read_decode(&mut r, id)?)
        }
        _ => return Err(WireError::UnsupportedType(message_type)),
    };

    Ok(Frame {
        header: FrameHeader {
            schema,
            message_type,
            sender_id,
        },
        message,
    })
}

/// Encodes a message the bridge is allowed to send.
///
/// The header always announces schema 2. Empty strings are written with a
/// zero length prefix; the null prefix is never emitted.
///
/// # Errors
/// - [`WireError::UnsupportedType`] for inbound-only variants
///   (`Status`, `Decode`)
/// - [`WireError::StringTooLong`] if a string exceeds the prefix range
pub fn encode(msg: &WireMessage) -> Result<Vec<u8>, WireError> {
    let mut w = Writer::new();
    match msg {
        WireMessage::Heartbeat(m) => {
            w.header(MessageType::Heartbeat, &m.id)?;
            w.u32(m.max_schema);
            w.string(&m.version)?;
            w.string(&m.revision)?;
        }
        WireMessage::Reply(m) => {
            w.header(MessageType::Reply, &m.id)?;
            w.u32(m.time);
            w.i32(m.snr);
            w.f64(m.delta_time);
            w.u32(m.delta_freq);
            w.string(&m.mode)?;
            w.string(&m.message)?;
            w.bool(m.low_conf);
            w.u8(m.modifiers);
        }
        WireMessage::HaltTx(m) => {
            w.header(MessageType::HaltTx, &m.id)?;
            w.bool(m.auto_tx_only);
        }
        WireMessage::Status(_) | WireMessage::Decode(_) => {
            return Err(WireError::UnsupportedType(
                msg.message_type().as_u32(),
            ));
        }
    }
    Ok(w.finish())
}

// ---------------------------------------------------------------------------
// Per-type field readers
// ---------------------------------------------------------------------------

fn read_heartbeat(r: &mut Reader<'_>, id: String) -> Result<Heartbeat, WireError> {
    Ok(Heartbeat {
        id,
        max_schema: r.u32("MaxSchema")?,
        version: r.string("Version")?,
        revision: r.string("Revision")?,
    })
}

// Struct literal fields evaluate in source order, which is wire order.
fn read_status(r: &mut Reader<'_>, id: String) -> Result<Status, WireError> {
    Ok(Status {
        id,
        dial_frequency: r.u64("DialFrequency")?,
        mode: r.string("Mode")?,
        dx_call: r.string("DXCall")?,
        report: r.string("Report")?,
        tx_mode: r.string("TxMode")?,
        tx_enabled: r.bool("TxEnabled")?,
        transmitting: r.bool("Transmitting")?,
        decoding: r.bool("Decoding")?,
        rx_df: r.u32("RxDF")?,
        tx_df: r.u32("TxDF")?,
        de_call: r.string("DECall")?,
        de_grid: r.string("DEGrid")?,
        dx_grid: r.string("DXGrid")?,
        tx_watchdog: r.bool("TxWatchdog")?,
        sub_mode: r.string("SubMode")?,
        fast_mode: r.bool("FastMode")?,
        special_op_mode: r.u8("SpecialOpMode")?,
        frequency_tolerance: r.u32("FrequencyTolerance")?,
        tr_period: r.u32("TRPeriod")?,
        config_name: r.string("ConfigName")?,
        tx_message: r.string("TxMessage")?,
    })
}

fn read_decode(r: &mut Reader<'_>, id: String) -> Result<Decode, WireError> {
    Ok(Decode {
        id,
        new: r.bool("New")?,
        time: r.u32("Time")?,
        snr: r.i32("SNR")?,
        delta_time: r.f64("DeltaTime")?,
        delta_frequency: r.u32("DeltaFrequency")?,
        mode: r.string("Mode")?,
        message: r.string("Message")?,
        low_confidence: r.bool("LowConfidence")?,
        off_air: r.bool("OffAir")?,
    })
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Bounds-checked cursor over a datagram.
///
/// `&[u8]` implements [`Buf`], whose getters panic on underflow, so every
/// read checks `remaining()` first and reports the field it was after.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn need(&self, n: usize, field: &'static str) -> Result<(), WireError> {
        if self.buf.remaining() < n {
            return Err(WireError::Truncated { field });
        }
        Ok(())
    }

    fn u8(&mut self, field: &'static str) -> Result<u8, WireError> {
        self.need(1, field)?;
        Ok(self.buf.get_u8())
    }

    fn bool(&mut self, field: &'static str) -> Result<bool, WireError> {
        Ok(self.u8(field)? != 0)
    }

    fn u32(&mut self, field: &'static str) -> Result<u32, WireError> {
        self.need(4, field)?;
        Ok(self.buf.get_u32())
    }

    fn i32(&mut self, field: &'static str) -> Result<i32, WireError> {
        self.need(4, field)?;
        Ok(self.buf.get_i32())
    }

    fn u64(&mut self, field: &'static str) -> Result<u64, WireError> {
        self.need(8, field)?;
        Ok(self.buf.get_u64())
    }

    fn f64(&mut self, field: &'static str) -> Result<f64, WireError> {
        self.need(8, field)?;
        Ok(self.buf.get_f64())
    }

    fn string(&mut self, field: &'static str) -> Result<String, WireError> {
        let len = self.u32(field)?;
        if len == NULL_STRING_LEN || len == 0 {
            return Ok(String::new());
        }
        let len = len as usize;
        self.need(len, field)?;
        let (raw, rest) = self.buf.split_at(len);
        self.buf = rest;
        // The payload is not guaranteed to be UTF-8.
        Ok(String::from_utf8_lossy(raw).into_owned())
    }
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

struct Writer {
    buf: BytesMut,
}

impl Writer {
    fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
        }
    }

    fn header(&mut self, ty: MessageType, id: &str) -> Result<(), WireError> {
        self.buf.put_u32(MAGIC);
        self.buf.put_u32(SCHEMA_2);
        self.buf.put_u32(ty.as_u32());
        self.string(id)
    }

    fn u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    fn bool(&mut self, v: bool) {
        self.buf.put_u8(u8::from(v));
    }

    fn u32(&mut self, v: u32) {
        self.buf.put_u32(v);
    }

    fn i32(&mut self, v: i32) {
        self.buf.put_i32(v);
    }

    fn f64(&mut self, v: f64) {
        self.buf.put_f64(v);
    }

    fn string(&mut self, s: &str) -> Result<(), WireError> {
        // NULL_STRING_LEN is reserved, so the longest encodable string is
        // one byte shorter than u32::MAX.
        let len = u32::try_from(s.len())
            .ok()
            .filter(|&len| len != NULL_STRING_LEN)
            .ok_or(WireError::StringTooLong(s.len()))?;
        self.buf.put_u32(len);
        self.buf.put_slice(s.as_bytes());
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
