//! Synthetic input events and the per-sample [`Burst`].
//!
//! Every [`SyntheticEvent`] maps onto exactly one Linux `input_event`
//! `(type, code, value)` triple.  The numeric constants below mirror
//! `<linux/input-event-codes.h>`; they are part of the kernel ABI and never
//! change.

/// `input_event` type and code constants from `<linux/input-event-codes.h>`.
pub mod codes {
    pub const EV_SYN: u16 = 0x00;
    pub const EV_KEY: u16 = 0x01;
    pub const EV_ABS: u16 = 0x03;

    pub const SYN_REPORT: u16 = 0x00;

    pub const BTN_TOUCH: u16 = 0x14a;

    pub const ABS_X: u16 = 0x00;
    pub const ABS_Y: u16 = 0x01;
    pub const ABS_PRESSURE: u16 = 0x18;

    pub const BUS_RS232: u16 = 0x13;
}

/// An absolute axis the bridge reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Pressure,
}

impl Axis {
    /// All axes, in the order they are declared and emitted.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Pressure];

    /// The `ABS_*` event code for this axis.
    pub fn code(self) -> u16 {
        match self {
            Axis::X => codes::ABS_X,
            Axis::Y => codes::ABS_Y,
            Axis::Pressure => codes::ABS_PRESSURE,
        }
    }
}

/// One event written to the virtual device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    /// `EV_ABS` with the raw device value.
    Abs { axis: Axis, value: i32 },
    /// `EV_KEY BTN_TOUCH`: pressed (`1`) or released (`0`).
    Touch(bool),
    /// `EV_SYN SYN_REPORT`: closes one coherent frame.
    Sync,
}

impl SyntheticEvent {
    pub fn event_type(&self) -> u16 {
        match self {
            SyntheticEvent::Abs { .. } => codes::EV_ABS,
            SyntheticEvent::Touch(_) => codes::EV_KEY,
            SyntheticEvent::Sync => codes::EV_SYN,
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            SyntheticEvent::Abs { axis, .. } => axis.code(),
            SyntheticEvent::Touch(_) => codes::BTN_TOUCH,
            SyntheticEvent::Sync => codes::SYN_REPORT,
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            SyntheticEvent::Abs { value, .. } => *value,
            SyntheticEvent::Touch(pressed) => i32::from(*pressed),
            SyntheticEvent::Sync => 0,
        }
    }
}

/// The ordered events derived from one sample.
///
/// A burst always ends with exactly one [`SyntheticEvent::Sync`]; everything
/// before it is a field update belonging to that frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Burst {
    events: Vec<SyntheticEvent>,
}

impl Burst {
    /// Largest possible burst: x, y, pressure, touch, sync.
    pub const MAX_LEN: usize = 5;

    pub(crate) fn new() -> Self {
        Self {
            events: Vec::with_capacity(Self::MAX_LEN),
        }
    }

    pub(crate) fn push(&mut self, event: SyntheticEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[SyntheticEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<'a> IntoIterator for &'a Burst {
    type Item = &'a SyntheticEvent;
    type IntoIter = std::slice::Iter<'a, SyntheticEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_event_maps_to_linux_triple() {
        let ev = SyntheticEvent::Abs { axis: Axis::Pressure, value: 77 };
        assert_eq!((ev.event_type(), ev.code(), ev.value()), (0x03, 0x18, 77));
    }

    #[test]
    fn test_touch_event_maps_to_btn_touch() {
        assert_eq!(SyntheticEvent::Touch(true).value(), 1);
        assert_eq!(SyntheticEvent::Touch(false).value(), 0);
        assert_eq!(SyntheticEvent::Touch(true).code(), codes::BTN_TOUCH);
        assert_eq!(SyntheticEvent::Touch(true).event_type(), codes::EV_KEY);
    }

    #[test]
    fn test_sync_event_is_syn_report() {
        let ev = SyntheticEvent::Sync;
        assert_eq!((ev.event_type(), ev.code(), ev.value()), (0, 0, 0));
    }
}
