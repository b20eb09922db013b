//! Decoder for the Wacom ISDV4 serial protocol ("tpc" Tablet PC digitizers).
//!
//! Wire format:
//! ```text
//! pen packet   (9 bytes):  [hdr][x_hi][x_mid][y_hi][y_mid][p_lo][ext][-][-]
//! query packet (11 bytes): [hdr][x_hi][x_mid][y_hi][y_mid][p_lo][ext][-][-][ver_hi][ver_lo]
//!
//! hdr:  1 C P E S T     (bit 7 always set; C = control, P = proximity,
//!                         E = eraser, S = side button, T = tip)
//! ext:  0 x1 x0 y1 y0 p9 p8 p7
//! ```
//!
//! Only the first byte of a packet has bit 7 set, which is what the stream
//! decoder uses to find packet boundaries.  Every coordinate is 16 bits split
//! across three bytes:
//!
//! ```text
//! x        = x_hi << 9 | x_mid << 2 | x1 x0
//! y        = y_hi << 9 | y_mid << 2 | y1 y0
//! pressure = p9 p8 p7 << 7 | p_lo
//! ```
//!
//! The query response reuses the same layout to report the axis maxima.
//!
//! # Commands
//!
//! The host talks to the digitizer with single ASCII bytes: [`CMD_STOP`]
//! halts sampling, [`CMD_QUERY`] asks for a query packet, [`CMD_START`]
//! resumes sampling.

use thiserror::Error;
use tracing::trace;

use crate::domain::ranges::{AxisRange, DeviceRanges};
use crate::domain::sample::{ButtonState, Sample, ToolType};

/// Stop sampling.
pub const CMD_STOP: &[u8] = b"0";
/// Start sampling.
pub const CMD_START: &[u8] = b"1";
/// Request the capability (query) packet.
pub const CMD_QUERY: &[u8] = b"*";

/// Length of a pen coordinate packet.
pub const PEN_PACKET_LEN: usize = 9;
/// Length of a query response packet.
pub const QUERY_PACKET_LEN: usize = 11;

const HEADER_BIT: u8 = 0x80;
const CONTROL_BIT: u8 = 0x40;
const PROXIMITY_BIT: u8 = 0x20;
const BUTTON_MASK: u8 = 0x07;

/// Errors that can occur while decoding ISDV4 packets.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the packet requires.
    #[error("insufficient data: need {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The first byte does not carry the packet header bit.
    #[error("missing header bit in first byte 0x{0:02X}")]
    MissingHeader(u8),

    /// A pen packet was expected but a control packet arrived, or vice versa.
    #[error("unexpected packet kind: header 0x{0:02X}")]
    UnexpectedKind(u8),

    /// A new header byte arrived before the current packet was complete.
    #[error("truncated packet: expected {expected} bytes, got {received}")]
    Truncated { expected: usize, received: usize },
}

/// Capabilities reported in the query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Isdv4Capabilities {
    pub max_x: i32,
    pub max_y: i32,
    pub max_pressure: i32,
    pub firmware_version: u16,
}

impl Isdv4Capabilities {
    /// Axis ranges for the virtual device; every axis starts at zero.
    pub fn ranges(&self) -> DeviceRanges {
        DeviceRanges {
            x: AxisRange::new(0, self.max_x),
            y: AxisRange::new(0, self.max_y),
            pressure: AxisRange::new(0, self.max_pressure),
        }
    }
}

/// One complete decoded packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Isdv4Packet {
    Pen(Sample),
    Query(Isdv4Capabilities),
}

// ── Packet parsing ────────────────────────────────────────────────────────────

fn require_len(p: &[u8], needed: usize) -> Result<(), ProtocolError> {
    if p.len() < needed {
        return Err(ProtocolError::InsufficientData {
            needed,
            available: p.len(),
        });
    }
    Ok(())
}

/// Decodes the three packed 16-bit fields shared by pen and query packets.
fn decode_fields(p: &[u8]) -> (i32, i32, i32) {
    let x = (i32::from(p[1]) << 9) | (i32::from(p[2]) << 2) | ((i32::from(p[6]) >> 5) & 0x03);
    let y = (i32::from(p[3]) << 9) | (i32::from(p[4]) << 2) | ((i32::from(p[6]) >> 3) & 0x03);
    let pressure = ((i32::from(p[6]) & 0x07) << 7) | i32::from(p[5]);
    (x, y, pressure)
}

/// Parses a 9-byte pen packet.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the slice is too short, lacks the header bit,
/// or is a control packet.
pub fn parse_pen_packet(p: &[u8]) -> Result<Sample, ProtocolError> {
    require_len(p, PEN_PACKET_LEN)?;
    if p[0] & HEADER_BIT == 0 {
        return Err(ProtocolError::MissingHeader(p[0]));
    }
    if p[0] & CONTROL_BIT != 0 {
        return Err(ProtocolError::UnexpectedKind(p[0]));
    }

    let (x, y, pressure) = decode_fields(p);
    let proximity = p[0] & PROXIMITY_BIT != 0;
    let buttons = ButtonState(p[0] & BUTTON_MASK);
    let tool = match (proximity, buttons.eraser()) {
        (false, _) => None,
        (true, true) => Some(ToolType::Eraser),
        (true, false) => Some(ToolType::Pen),
    };

    Ok(Sample {
        x: Some(x),
        y: Some(y),
        pressure: Some(pressure),
        proximity,
        tool,
        buttons,
    })
}

/// Parses an 11-byte query response.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the slice is too short, lacks the header bit,
/// or is not a control packet.
pub fn parse_query_packet(p: &[u8]) -> Result<Isdv4Capabilities, ProtocolError> {
    require_len(p, QUERY_PACKET_LEN)?;
    if p[0] & HEADER_BIT == 0 {
        return Err(ProtocolError::MissingHeader(p[0]));
    }
    if p[0] & CONTROL_BIT == 0 {
        return Err(ProtocolError::UnexpectedKind(p[0]));
    }

    let (max_x, max_y, max_pressure) = decode_fields(p);
    let firmware_version = (u16::from(p[9]) << 7) | u16::from(p[10]);
    Ok(Isdv4Capabilities {
        max_x,
        max_y,
        max_pressure,
        firmware_version,
    })
}

// ── Stream decoder ────────────────────────────────────────────────────────────

/// Reassembles ISDV4 packets from an arbitrary chunked byte stream.
///
/// Serial reads return whatever happens to be in the UART buffer, so a packet
/// may be split across reads and a read may hold several packets.  Bytes that
/// precede the first header byte are discarded.
#[derive(Debug, Default)]
pub struct Isdv4Decoder {
    buf: Vec<u8>,
    discarded: u64,
}

impl Isdv4Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Total number of bytes dropped while resynchronising.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Drops any buffered partial packet.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Returns the next complete packet, or `None` if more bytes are needed.
    ///
    /// A packet interrupted by a new header byte is reported as
    /// [`ProtocolError::Truncated`] and skipped; decoding resumes at the new
    /// header.
    pub fn next_packet(&mut self) -> Option<Result<Isdv4Packet, ProtocolError>> {
        let start = match self.buf.iter().position(|b| b & HEADER_BIT != 0) {
            Some(pos) => pos,
            None => {
                self.discard(self.buf.len());
                return None;
            }
        };
        self.discard(start);

        let expected = if self.buf[0] & CONTROL_BIT != 0 {
            QUERY_PACKET_LEN
        } else {
            PEN_PACKET_LEN
        };

        let window = self.buf.len().min(expected);
        if let Some(next) = self.buf[1..window].iter().position(|b| b & HEADER_BIT != 0) {
            let received = next + 1;
            self.discard(received);
            return Some(Err(ProtocolError::Truncated { expected, received }));
        }
        if self.buf.len() < expected {
            return None;
        }

        let packet: Vec<u8> = self.buf.drain(..expected).collect();
        let decoded = if expected == QUERY_PACKET_LEN {
            parse_query_packet(&packet).map(Isdv4Packet::Query)
        } else {
            parse_pen_packet(&packet).map(Isdv4Packet::Pen)
        };
        Some(decoded)
    }

    fn discard(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        self.buf.drain(..count);
        self.discarded += count as u64;
        trace!(count, "isdv4: discarded bytes while resynchronising");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
