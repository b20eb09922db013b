//! Absolute-axis value ranges reported by a digitizer.

use crate::event::Axis;

/// Inclusive `[min, max]` bounds of one absolute axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

/// The ranges of every axis the bridge declares on the virtual device.
///
/// Obtained once, from the initial state query of the sample source, and
/// used only during capability registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceRanges {
    pub x: AxisRange,
    pub y: AxisRange,
    pub pressure: AxisRange,
}

impl DeviceRanges {
    /// Returns the range declared for `axis`.
    pub fn range_for(&self, axis: Axis) -> AxisRange {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Pressure => self.pressure,
        }
    }
}
