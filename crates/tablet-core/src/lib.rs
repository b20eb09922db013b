//! # tablet-core
//!
//! Shared library for tablet-bridge containing the digitizer sample model,
//! the synthetic input-event vocabulary, the sample-to-event translation
//! policy, and the ISDV4 serial protocol decoder.
//!
//! It has zero dependencies on OS APIs: nothing in here opens a device node or
//! talks to uinput.  Everything is plain data in, plain data out, so it can be
//! unit-tested on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! tablet-bridge turns a serial pen digitizer (the kind built into Tablet PCs)
//! into a regular Linux input device.  The pipeline is:
//!
//! ```text
//! serial bytes ──► protocol::isdv4 ──► Sample ──► translate ──► Burst ──► uinput
//! ```
//!
//! - **`domain`** – What a reading *is*: [`Sample`], [`DeviceRanges`], and the
//!   touch [`PressureThreshold`].
//!
//! - **`event`** – What we *emit*: [`SyntheticEvent`] values that map 1:1 onto
//!   Linux `input_event` triples, and the [`Burst`] that groups one frame.
//!
//! - **`translate`** – The policy that maps one sample onto one burst
//!   (proximity reset, field suppression, touch derivation).
//!
//! - **`protocol`** – The ISDV4 byte-stream decoder that produces samples.

pub mod domain;
pub mod event;
pub mod protocol;
pub mod translate;

// Re-export the most-used types at the crate root so callers can write
// `tablet_core::Sample` instead of `tablet_core::domain::sample::Sample`.
pub use domain::sample::{ButtonState, Sample, ToolType};
pub use domain::ranges::{AxisRange, DeviceRanges};
pub use domain::threshold::{PressureThreshold, ThresholdError};
pub use event::{Axis, Burst, SyntheticEvent};
pub use protocol::isdv4::{Isdv4Capabilities, Isdv4Decoder, Isdv4Packet, ProtocolError};
pub use translate::translate;
