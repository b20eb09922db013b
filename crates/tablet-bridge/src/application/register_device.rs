//! Capability registration: turning an opened sink into a usable virtual tablet.
//!
//! This use case sits at the application layer and drives a
//! [`VirtualInputSink`] through its one-time setup sequence.  The uinput
//! implementation lives in the infrastructure layer.
//!
//! # Setup sequence
//!
//! ```text
//! open ─► declare TouchKey, X, Y, Pressure ─► set ranges + metadata ─► commit
//! ```
//!
//! Any failing step aborts registration.  The sink is destroyed before the
//! error is returned, so callers only ever hold either nothing or a fully
//! created [`RegisteredDevice`].  There is no retry.

use std::fmt;

use tablet_core::{Axis, AxisRange, DeviceRanges, SyntheticEvent};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::DeviceMetadata;

/// Error type for virtual-device operations.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("axis {0:?} range set before the axis was declared")]
    UndeclaredAxis(Axis),
    #[error("operation not valid in the current device state: {0}")]
    InvalidState(&'static str),
    #[error("platform error: {0}")]
    Platform(String),
}

/// A class of events the virtual device will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// `EV_KEY` with `BTN_TOUCH`.
    TouchKey,
    /// `EV_ABS` with the given axis.
    Axis(Axis),
}

/// The steps of the setup sequence, used to report where registration failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStep {
    Open,
    DeclareCapability(Capability),
    SetAxisRange(Axis),
    SetMetadata,
    Commit,
}

impl fmt::Display for SetupStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupStep::Open => write!(f, "open"),
            SetupStep::DeclareCapability(c) => write!(f, "declare capability {c:?}"),
            SetupStep::SetAxisRange(a) => write!(f, "set {a:?} range"),
            SetupStep::SetMetadata => write!(f, "set device metadata"),
            SetupStep::Commit => write!(f, "create device"),
        }
    }
}

/// Registration failed; the bridge must not start.
#[derive(Debug, Error)]
#[error("virtual device setup failed at step '{step}': {source}")]
pub struct RegistrationError {
    pub step: SetupStep,
    #[source]
    pub source: SinkError,
}

/// Order-sensitive virtual input device interface.
///
/// Opening is done by whoever constructs the sink; every other step of the
/// device lifecycle is a method here.
pub trait VirtualInputSink: Send {
    /// Declares one event class the device will produce.
    fn declare_capability(&mut self, capability: Capability) -> Result<(), SinkError>;

    /// Sets the value bounds of a previously declared axis.
    fn set_axis_range(&mut self, axis: Axis, range: AxisRange) -> Result<(), SinkError>;

    /// Sets the name and bus/vendor/product/version identity.
    fn set_metadata(&mut self, metadata: &DeviceMetadata) -> Result<(), SinkError>;

    /// Finalizes device creation.  No capability may change afterwards.
    fn commit(&mut self) -> Result<(), SinkError>;

    /// Writes one event.
    fn emit(&mut self, event: &SyntheticEvent) -> Result<(), SinkError>;

    /// Tears the device down and releases the handle.
    fn destroy(&mut self) -> Result<(), SinkError>;
}

/// A fully created virtual device.
///
/// Destroyed exactly once: explicitly through [`RegisteredDevice::destroy`],
/// or on drop if that never happened.
pub struct RegisteredDevice<S: VirtualInputSink> {
    sink: Option<S>,
}

impl<S: VirtualInputSink> RegisteredDevice<S> {
    fn new(sink: S) -> Self {
        Self { sink: Some(sink) }
    }

    /// Writes one event to the device.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::InvalidState`] after the device was destroyed, or
    /// whatever the sink reports for the write.
    pub fn emit(&mut self, event: &SyntheticEvent) -> Result<(), SinkError> {
        match self.sink.as_mut() {
            Some(sink) => sink.emit(event),
            None => Err(SinkError::InvalidState("device already destroyed")),
        }
    }

    /// Returns `true` until the device has been destroyed.
    pub fn is_live(&self) -> bool {
        self.sink.is_some()
    }

    /// Destroys the device.  Further calls are no-ops.
    pub fn destroy(&mut self) -> Result<(), SinkError> {
        match self.sink.take() {
            Some(mut sink) => {
                info!("destroying virtual device");
                sink.destroy()
            }
            None => Ok(()),
        }
    }
}

impl<S: VirtualInputSink> Drop for RegisteredDevice<S> {
    fn drop(&mut self) {
        if let Err(e) = self.destroy() {
            warn!("virtual device destroy failed: {e}");
        }
    }
}

/// Runs the full setup sequence against a freshly opened sink.
///
/// `open` is called exactly once.  If any later step fails, the opened sink is
/// destroyed before the error is returned.
///
/// # Errors
///
/// Returns [`RegistrationError`] naming the first step that failed.
pub fn register_device<S, F>(
    open: F,
    ranges: &DeviceRanges,
    metadata: &DeviceMetadata,
) -> Result<RegisteredDevice<S>, RegistrationError>
where
    S: VirtualInputSink,
    F: FnOnce() -> Result<S, SinkError>,
{
    let sink = open().map_err(failed(SetupStep::Open))?;

    // Dropping `device` on the error path destroys the half-configured sink.
    let mut device = RegisteredDevice::new(sink);
    if let Some(sink) = device.sink.as_mut() {
        configure(sink, ranges, metadata)?;
    }

    info!(
        "virtual device '{}' created ({:04x}:{:04x})",
        metadata.name, metadata.vendor, metadata.product
    );
    Ok(device)
}

fn failed(step: SetupStep) -> impl FnOnce(SinkError) -> RegistrationError {
    move |source| RegistrationError { step, source }
}

fn configure<S: VirtualInputSink>(
    sink: &mut S,
    ranges: &DeviceRanges,
    metadata: &DeviceMetadata,
) -> Result<(), RegistrationError> {
    let capabilities = std::iter::once(Capability::TouchKey)
        .chain(Axis::ALL.into_iter().map(Capability::Axis));
    for capability in capabilities {
        sink.declare_capability(capability)
            .map_err(failed(SetupStep::DeclareCapability(capability)))?;
    }

    for axis in Axis::ALL {
        let range = ranges.range_for(axis);
        debug!(?axis, min = range.min, max = range.max, "setting axis range");
        sink.set_axis_range(axis, range)
            .map_err(failed(SetupStep::SetAxisRange(axis)))?;
    }

    sink.set_metadata(metadata).map_err(failed(SetupStep::SetMetadata))?;
    sink.commit().map_err(failed(SetupStep::Commit))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::{mock, predicate::eq, Sequence};

    mock! {
        Sink {}

        impl VirtualInputSink for Sink {
            fn declare_capability(&mut self, capability: Capability) -> Result<(), SinkError>;
            fn set_axis_range(&mut self, axis: Axis, range: AxisRange) -> Result<(), SinkError>;
            fn set_metadata(&mut self, metadata: &DeviceMetadata) -> Result<(), SinkError>;
            fn commit(&mut self) -> Result<(), SinkError>;
            fn emit(&mut self, event: &SyntheticEvent) -> Result<(), SinkError>;
            fn destroy(&mut self) -> Result<(), SinkError>;
        }
    }

    fn ranges() -> DeviceRanges {
        DeviceRanges {
            x: AxisRange::new(0, 24000),
            y: AxisRange::new(0, 18000),
            pressure: AxisRange::new(0, 255),
        }
    }

    #[test]
    fn test_register_runs_setup_steps_in_order() {
        // Arrange
        let mut seq = Sequence::new();
        let mut sink = MockSink::new();
        sink.expect_declare_capability()
            .with(eq(Capability::TouchKey))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        for axis in Axis::ALL {
            sink.expect_declare_capability()
                .with(eq(Capability::Axis(axis)))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        for axis in Axis::ALL {
            sink.expect_set_axis_range()
                .with(eq(axis), eq(ranges().range_for(axis)))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }
        sink.expect_set_metadata()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        sink.expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        sink.expect_destroy()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        // Act
        let mut device =
            register_device(move || Ok(sink), &ranges(), &DeviceMetadata::default()).unwrap();

        // Assert – device is live until destroyed, and destroy is idempotent
        assert!(device.is_live());
        device.destroy().unwrap();
        device.destroy().unwrap();
        assert!(!device.is_live());
    }

    #[test]
    fn test_failed_commit_destroys_sink_and_reports_step() {
        // Arrange
        let mut sink = MockSink::new();
        sink.expect_declare_capability().returning(|_| Ok(()));
        sink.expect_set_axis_range().returning(|_, _| Ok(()));
        sink.expect_set_metadata().returning(|_| Ok(()));
        sink.expect_commit()
            .returning(|| Err(SinkError::Platform("UI_DEV_CREATE refused".into())));
        sink.expect_destroy().times(1).returning(|| Ok(()));

        // Act
        let result = register_device(move || Ok(sink), &ranges(), &DeviceMetadata::default());

        // Assert
        let err = result.err().expect("commit failure must abort registration");
        assert_eq!(err.step, SetupStep::Commit);
    }

    #[test]
    fn test_failed_declare_stops_before_ranges() {
        // Arrange – the pressure axis cannot be declared
        let mut sink = MockSink::new();
        sink.expect_declare_capability()
            .returning(|c| match c {
                Capability::Axis(Axis::Pressure) => {
                    Err(SinkError::Platform("UI_SET_ABSBIT failed".into()))
                }
                _ => Ok(()),
            });
        sink.expect_set_axis_range().times(0);
        sink.expect_set_metadata().times(0);
        sink.expect_commit().times(0);
        sink.expect_destroy().times(1).returning(|| Ok(()));

        // Act
        let err = register_device(move || Ok(sink), &ranges(), &DeviceMetadata::default())
            .err()
            .unwrap();

        // Assert
        assert_eq!(
            err.step,
            SetupStep::DeclareCapability(Capability::Axis(Axis::Pressure))
        );
    }

    #[test]
    fn test_failed_open_reports_open_step() {
        let result = register_device::<MockSink, _>(
            || Err(SinkError::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied))),
            &ranges(),
            &DeviceMetadata::default(),
        );

        let err = result.err().unwrap();
        assert_eq!(err.step, SetupStep::Open);
        assert!(err.to_string().contains("open"));
    }

    #[test]
    fn test_drop_destroys_device_exactly_once() {
        // Arrange
        let mut sink = MockSink::new();
        sink.expect_declare_capability().returning(|_| Ok(()));
        sink.expect_set_axis_range().returning(|_, _| Ok(()));
        sink.expect_set_metadata().returning(|_| Ok(()));
        sink.expect_commit().returning(|| Ok(()));
        sink.expect_destroy().times(1).returning(|| Ok(()));

        // Act – mockall verifies `times(1)` when the mock is dropped
        let device = register_device(move || Ok(sink), &ranges(), &DeviceMetadata::default());
        drop(device);
    }

    #[test]
    fn test_emit_after_destroy_is_rejected() {
        let mut sink = MockSink::new();
        sink.expect_declare_capability().returning(|_| Ok(()));
        sink.expect_set_axis_range().returning(|_, _| Ok(()));
        sink.expect_set_metadata().returning(|_| Ok(()));
        sink.expect_commit().returning(|| Ok(()));
        sink.expect_destroy().returning(|| Ok(()));
        let mut device =
            register_device(move || Ok(sink), &ranges(), &DeviceMetadata::default()).unwrap();

        device.destroy().unwrap();

        assert!(matches!(
            device.emit(&SyntheticEvent::Sync),
            Err(SinkError::InvalidState(_))
        ));
    }
}
