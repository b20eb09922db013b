//! Digitizer wire protocols that produce [`Sample`](crate::Sample)s.

pub mod isdv4;

pub use isdv4::{Isdv4Capabilities, Isdv4Decoder, Isdv4Packet, ProtocolError};
