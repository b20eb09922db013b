//! Linux virtual tablet via uinput.
//!
//! # What is uinput? (for beginners)
//!
//! `/dev/uinput` lets a user-space process create an input device that the
//! kernel treats exactly like real hardware.  The process describes the
//! device (which keys and absolute axes it has, their ranges, bus and vendor
//! IDs), then asks the kernel to create it.  From then on every `input_event`
//! written to the file descriptor is delivered through evdev to X11, Wayland
//! compositors, or Android's input stack.
//!
//! # Build then create
//!
//! `evdevil` describes a uinput device with a consuming builder that must be
//! finished in one go.  The bridge, however, declares capabilities one step
//! at a time so it can report exactly which step failed.  [`UinputSink`]
//! therefore collects the declarations into a `PendingDevice` and only
//! creates the kernel device when `commit` is called.
//!
//! ```text
//!   Pending ── commit ──► Created ── destroy ──► Closed
//! ```
//!
//! Dropping the `UinputDevice` handle closes the file descriptor, which makes
//! the kernel remove the device.
//!
//! # Frames
//!
//! `UinputDevice::write` ends every call with its own `SYN_REPORT`.  A burst
//! already carries its closing [`SyntheticEvent::Sync`], so `emit` writes the
//! raw `input_event` straight to the device descriptor instead.  The burst's
//! own sync is then the only frame boundary readers see.
//!
//! # Permissions
//!
//! Opening `/dev/uinput` normally requires root, or membership of a group
//! granted access by a udev rule.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::mem;
use std::os::unix::io::AsRawFd;
use std::path::Path;

use evdevil::event::{Abs, Key};
use evdevil::uinput::{AbsSetup, UinputDevice};
use evdevil::{AbsInfo, Bus, InputId, InputProp};
use tablet_core::event::codes::BUS_RS232;
use tablet_core::{Axis, AxisRange, SyntheticEvent};
use tracing::{debug, info, warn};

use crate::application::register_device::{Capability, SinkError, VirtualInputSink};
use crate::domain::DeviceMetadata;

const UINPUT_NODE: &str = "/dev/uinput";

fn abs_for(axis: Axis) -> Abs {
    match axis {
        Axis::X => Abs::X,
        Axis::Y => Abs::Y,
        Axis::Pressure => Abs::PRESSURE,
    }
}

/// Opens `node` the way the device builder will, then closes it again.
fn probe_node(node: &Path) -> io::Result<()> {
    OpenOptions::new().read(true).write(true).open(node)?;
    Ok(())
}

/// Maps a raw `BUS_*` value onto evdevil's named bus types.
fn bus_for(raw: u16) -> Bus {
    match raw {
        BUS_RS232 => Bus::RS232,
        0x03 => Bus::USB,
        0x05 => Bus::BLUETOOTH,
        0x06 => Bus::VIRTUAL,
        0x18 => Bus::I2C,
        other => {
            warn!(bus = other, "unknown bus type, presenting the device as virtual");
            Bus::VIRTUAL
        }
    }
}

/// Writes one `input_event` without closing the frame.
fn write_event(device: &UinputDevice, event: &SyntheticEvent) -> io::Result<()> {
    let raw = libc::input_event {
        time: libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
        type_: event.event_type(),
        code: event.code(),
        value: event.value(),
    };
    let len = mem::size_of::<libc::input_event>();
    // SAFETY: `raw` is a plain C struct that outlives the call and the
    // descriptor is owned by `device`.
    let written = unsafe {
        libc::write(
            device.as_raw_fd(),
            (&raw as *const libc::input_event).cast(),
            len,
        )
    };
    if written < 0 {
        return Err(io::Error::last_os_error());
    }
    if written as usize != len {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            "short input_event write",
        ));
    }
    Ok(())
}

/// Declarations collected before the device exists.
#[derive(Debug, Default)]
struct PendingDevice {
    touch_key: bool,
    /// Declared axes; `None` until a range is set.
    axes: BTreeMap<u16, (Axis, Option<AxisRange>)>,
    metadata: Option<DeviceMetadata>,
}

impl PendingDevice {
    fn create(self) -> Result<UinputDevice, SinkError> {
        let metadata = self.metadata.unwrap_or_default();
        let mut setups = Vec::with_capacity(self.axes.len());
        for (axis, range) in self.axes.into_values() {
            let range = range.ok_or(SinkError::InvalidState("axis declared without a range"))?;
            setups.push(AbsSetup::new(abs_for(axis), AbsInfo::new(range.min, range.max)));
        }
        let keys: Vec<Key> = if self.touch_key { vec![Key::BTN_TOUCH] } else { Vec::new() };

        let device = UinputDevice::builder()?
            .with_input_id(InputId::new(
                bus_for(metadata.bus),
                metadata.vendor,
                metadata.product,
                metadata.version,
            ))?
            .with_props([InputProp::DIRECT])?
            .with_abs_axes(setups)?
            .with_keys(keys)?
            .build(&metadata.name)?;
        Ok(device)
    }
}

enum SinkState {
    Pending(PendingDevice),
    Created(UinputDevice),
    Closed,
}

/// A [`VirtualInputSink`] backed by a kernel uinput device.
pub struct UinputSink {
    state: SinkState,
}

impl UinputSink {
    /// Checks that `/dev/uinput` can be opened read-write, as the device
    /// builder will open it, and prepares an empty device description.  The
    /// kernel device is not created until `commit`.
    pub fn open() -> Result<Self, SinkError> {
        probe_node(Path::new(UINPUT_NODE))?;
        debug!("{UINPUT_NODE} is accessible");
        Ok(Self {
            state: SinkState::Pending(PendingDevice::default()),
        })
    }

    fn pending(&mut self) -> Result<&mut PendingDevice, SinkError> {
        match &mut self.state {
            SinkState::Pending(p) => Ok(p),
            _ => Err(SinkError::InvalidState("device already created")),
        }
    }
}

impl VirtualInputSink for UinputSink {
    fn declare_capability(&mut self, capability: Capability) -> Result<(), SinkError> {
        let pending = self.pending()?;
        match capability {
            Capability::TouchKey => pending.touch_key = true,
            Capability::Axis(axis) => {
                pending.axes.entry(axis.code()).or_insert((axis, None));
            }
        }
        Ok(())
    }

    fn set_axis_range(&mut self, axis: Axis, range: AxisRange) -> Result<(), SinkError> {
        let pending = self.pending()?;
        match pending.axes.get_mut(&axis.code()) {
            Some(slot) => {
                slot.1 = Some(range);
                Ok(())
            }
            None => Err(SinkError::UndeclaredAxis(axis)),
        }
    }

    fn set_metadata(&mut self, metadata: &DeviceMetadata) -> Result<(), SinkError> {
        self.pending()?.metadata = Some(metadata.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        let pending = match std::mem::replace(&mut self.state, SinkState::Closed) {
            SinkState::Pending(p) => p,
            other => {
                self.state = other;
                return Err(SinkError::InvalidState("device already created"));
            }
        };
        let device = pending.create()?;
        match device.sysname() {
            Ok(name) => info!(
                "uinput device created: /sys/devices/virtual/input/{}",
                name.to_string_lossy()
            ),
            Err(e) => debug!("uinput device created, sysname unavailable: {e}"),
        }
        self.state = SinkState::Created(device);
        Ok(())
    }

    fn emit(&mut self, event: &SyntheticEvent) -> Result<(), SinkError> {
        match &self.state {
            SinkState::Created(device) => {
                write_event(device, event)?;
                Ok(())
            }
            _ => Err(SinkError::InvalidState("device not created")),
        }
    }

    fn destroy(&mut self) -> Result<(), SinkError> {
        // Dropping the handle removes the device; a pending description has
        // nothing to tear down.
        self.state = SinkState::Closed;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
