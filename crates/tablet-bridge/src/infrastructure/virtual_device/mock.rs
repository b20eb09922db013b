//! Recording virtual device for tests.
//!
//! `MockVirtualDevice` performs no OS calls.  Every successful call is
//! appended to a shared [`SinkJournal`], which stays readable after the device
//! itself has been moved into the bridge (or dropped).
//!
//! ```ignore
//! let sink = MockVirtualDevice::new();
//! let journal = sink.journal();
//! let device = register_device(move || Ok(sink), &ranges, &metadata)?;
//! // ...
//! assert_eq!(journal.destroy_count(), 1);
//! ```

use std::sync::{Arc, Mutex};

use tablet_core::{Axis, AxisRange, SyntheticEvent};

use crate::application::register_device::{Capability, SinkError, VirtualInputSink};
use crate::domain::DeviceMetadata;

/// One recorded call on the mock sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Declare(Capability),
    SetRange(Axis, AxisRange),
    SetMetadata(DeviceMetadata),
    Commit,
    Emit(SyntheticEvent),
    Destroy,
}

/// Shared, clonable view of everything a [`MockVirtualDevice`] recorded.
#[derive(Debug, Clone, Default)]
pub struct SinkJournal {
    calls: Arc<Mutex<Vec<SinkCall>>>,
}

impl SinkJournal {
    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the events that were written successfully, in order.
    pub fn emitted(&self) -> Vec<SyntheticEvent> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                SinkCall::Emit(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    pub fn destroy_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == SinkCall::Destroy)
            .count()
    }
}

/// A sink that records calls instead of creating a device.
#[derive(Debug, Default)]
pub struct MockVirtualDevice {
    journal: SinkJournal,
    fail_declare: Option<Capability>,
    fail_commit: bool,
    fail_emit: Option<SyntheticEvent>,
}

impl MockVirtualDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn journal(&self) -> SinkJournal {
        self.journal.clone()
    }

    /// Makes `declare_capability(capability)` fail.
    pub fn failing_declare(mut self, capability: Capability) -> Self {
        self.fail_declare = Some(capability);
        self
    }

    /// Makes `commit` fail.
    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    /// Makes every write of exactly `event` fail.
    pub fn failing_emit(mut self, event: SyntheticEvent) -> Self {
        self.fail_emit = Some(event);
        self
    }
}

fn mock_failure(what: &str) -> SinkError {
    SinkError::Platform(format!("mock {what} failure"))
}

impl VirtualInputSink for MockVirtualDevice {
    fn declare_capability(&mut self, capability: Capability) -> Result<(), SinkError> {
        if self.fail_declare == Some(capability) {
            return Err(mock_failure("declare"));
        }
        self.journal.record(SinkCall::Declare(capability));
        Ok(())
    }

    fn set_axis_range(&mut self, axis: Axis, range: AxisRange) -> Result<(), SinkError> {
        self.journal.record(SinkCall::SetRange(axis, range));
        Ok(())
    }

    fn set_metadata(&mut self, metadata: &DeviceMetadata) -> Result<(), SinkError> {
        self.journal.record(SinkCall::SetMetadata(metadata.clone()));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SinkError> {
        if self.fail_commit {
            return Err(mock_failure("commit"));
        }
        self.journal.record(SinkCall::Commit);
        Ok(())
    }

    fn emit(&mut self, event: &SyntheticEvent) -> Result<(), SinkError> {
        if self.fail_emit == Some(*event) {
            return Err(mock_failure("write"));
        }
        self.journal.record(SinkCall::Emit(*event));
        Ok(())
    }

    fn destroy(&mut self) -> Result<(), SinkError> {
        self.journal.record(SinkCall::Destroy);
        Ok(())
    }
}
