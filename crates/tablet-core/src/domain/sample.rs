//! The normalized digitizer sample.
//!
//! A [`Sample`] is a point-in-time reading.  Each new sample supersedes the
//! previous one; samples carry no identity beyond recency.
//!
//! # Absent fields
//!
//! Some backends cannot report every field in every packet.  Instead of a
//! magic "not present" number that could collide with a real reading, every
//! measured field is an `Option<i32>`: `None` means the backend did not supply
//! it, and the bridge will not emit an event for it.

/// Which end of the stylus is in proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    Pen,
    Eraser,
}

/// Raw stylus button bits as reported by the digitizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState(pub u8);

impl ButtonState {
    pub const TIP: u8 = 1 << 0;
    pub const SIDE: u8 = 1 << 1;
    pub const ERASER: u8 = 1 << 2;

    /// Returns `true` if the pen tip switch is closed.
    pub fn tip(&self) -> bool {
        self.0 & Self::TIP != 0
    }

    /// Returns `true` if the barrel (side) button is held.
    pub fn side(&self) -> bool {
        self.0 & Self::SIDE != 0
    }

    /// Returns `true` if the eraser end is active.
    pub fn eraser(&self) -> bool {
        self.0 & Self::ERASER != 0
    }
}

/// One normalized reading from a digitizer backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    /// Absolute X position in device-native units.
    pub x: Option<i32>,
    /// Absolute Y position in device-native units.
    pub y: Option<i32>,
    /// Tip pressure in device-native units.
    pub pressure: Option<i32>,
    /// `true` while the tool is within sensing range of the surface.
    pub proximity: bool,
    pub tool: Option<ToolType>,
    pub buttons: ButtonState,
}

impl Sample {
    /// A sample with the tool in range and every positional field present.
    pub fn in_range(x: i32, y: i32, pressure: i32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            pressure: Some(pressure),
            proximity: true,
            tool: Some(ToolType::Pen),
            buttons: ButtonState::default(),
        }
    }

    /// A sample reporting that the tool has left sensing range.
    pub fn out_of_range() -> Self {
        Self::default()
    }
}
