//! Scripted sample source for tests.
//!
//! Each `read` pops the next scripted result.  Once the script is empty the
//! source reports [`ReadOutcome::Exhausted`], or keeps reporting
//! [`ReadOutcome::NoSample`] if built with [`MockSampleSource::idle`].
//!
//! `stop_after` clears a shared `running` flag after a number of reads, which
//! stands in for a signal arriving mid-stream.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tablet_core::{AxisRange, DeviceRanges};

use crate::application::run_bridge::{ReadOutcome, SampleSource, SourceError};

pub struct MockSampleSource {
    script: VecDeque<Result<ReadOutcome, SourceError>>,
    ranges: DeviceRanges,
    reads: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    stop: Option<(usize, Arc<AtomicBool>)>,
    idle_when_empty: bool,
}

impl MockSampleSource {
    pub fn new(script: Vec<Result<ReadOutcome, SourceError>>) -> Self {
        Self {
            script: script.into(),
            ranges: DeviceRanges {
                x: AxisRange::new(0, 24000),
                y: AxisRange::new(0, 18000),
                pressure: AxisRange::new(0, 255),
            },
            reads: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
            stop: None,
            idle_when_empty: false,
        }
    }

    /// A source that never produces a sample and never ends.
    pub fn idle() -> Self {
        Self {
            idle_when_empty: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_ranges(mut self, ranges: DeviceRanges) -> Self {
        self.ranges = ranges;
        self
    }

    /// Clears `running` once `reads` reads have completed.
    pub fn stop_after(mut self, reads: usize, running: Arc<AtomicBool>) -> Self {
        self.stop = Some((reads, running));
        self
    }

    /// Counter of `read` calls, readable after the source has been moved.
    pub fn read_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    /// Counter of `close` calls.
    pub fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl SampleSource for MockSampleSource {
    fn device_ranges(&self) -> DeviceRanges {
        self.ranges
    }

    fn read(&mut self) -> Result<ReadOutcome, SourceError> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((after, running)) = &self.stop {
            if n >= *after {
                running.store(false, Ordering::SeqCst);
            }
        }
        match self.script.pop_front() {
            Some(next) => next,
            None if self.idle_when_empty => Ok(ReadOutcome::NoSample),
            None => Ok(ReadOutcome::Exhausted),
        }
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
