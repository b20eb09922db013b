//! TabletBridge: the run loop that pumps samples into the virtual device.
//!
//! # State machine
//!
//! ```text
//!            first sample                 running cleared / EOF / fatal read
//!   Idle ───────────────────► Streaming ─────────────────────────────────► Terminating
//!    │                         │    ▲                                          │
//!    │                         └────┘ one sample, or an empty poll             ▼
//!    └──────────────────────────────────────────────────────────────►  shutdown()
//! ```
//!
//! # Cancellation
//!
//! Signals never touch the device directly.  The signal task only clears the
//! shared `running` flag; the loop checks it at the top of every iteration and
//! then runs [`TabletBridge::shutdown`] from ordinary code.  The sample source
//! bounds each `read` (the serial source polls for at most 100 ms), which
//! bounds how long a stop request can go unnoticed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tablet_core::{translate, Burst, DeviceRanges, PressureThreshold, Sample};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::register_device::{
    register_device, RegisteredDevice, RegistrationError, SinkError, VirtualInputSink,
};
use crate::domain::BridgeConfig;

/// Error type for sample source operations.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backend itself failed; the bridge cannot continue.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Bytes arrived that could not be decoded; the next read may be fine.
    #[error("malformed input: {0}")]
    Malformed(String),
    /// The digitizer did not answer during setup.
    #[error("device did not respond: {0}")]
    NoResponse(String),
}

/// Result of one poll of the sample source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Sample(Sample),
    /// Nothing ready right now.  Not an error.
    NoSample,
    /// The backend reached end of stream.
    Exhausted,
}

/// A backend that yields normalized digitizer samples.
pub trait SampleSource: Send {
    /// Axis ranges obtained from the initial state query done at open.
    fn device_ranges(&self) -> DeviceRanges;

    /// Returns the next sample, or `NoSample` if none is ready.
    ///
    /// Implementations should not block indefinitely; a bounded wait keeps
    /// stop requests responsive.
    fn read(&mut self) -> Result<ReadOutcome, SourceError>;

    /// Shuts the backend down.  Must be safe to call more than once.
    fn close(&mut self);
}

/// Run state of the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Registered, no sample accepted yet.
    Idle,
    Streaming,
    Terminating,
}

/// Why the run loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The `running` flag was cleared (SIGINT / SIGTERM).
    Interrupted,
    /// The sample source reached end of stream.
    SourceExhausted,
}

/// Fatal bridge errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("sample source failed: {0}")]
    Source(#[from] SourceError),
}

/// Counters kept while streaming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    pub samples: u64,
    pub empty_polls: u64,
    pub events_written: u64,
    pub write_failures: u64,
    pub malformed_reads: u64,
}

/// Owns the sample source and the registered device for the process lifetime.
pub struct TabletBridge<S: SampleSource, D: VirtualInputSink> {
    source: S,
    device: RegisteredDevice<D>,
    threshold: PressureThreshold,
    state: RunState,
    stats: BridgeStats,
}

impl<S: SampleSource, D: VirtualInputSink> TabletBridge<S, D> {
    /// Creates a bridge from an already registered device.
    pub fn new(source: S, device: RegisteredDevice<D>, threshold: PressureThreshold) -> Self {
        Self {
            source,
            device,
            threshold,
            state: RunState::Idle,
            stats: BridgeStats::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    /// Pumps samples until `running` is cleared or the source ends.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Source`] if the sample source fails with an I/O
    /// error.  The device is *not* destroyed here; call [`Self::shutdown`].
    pub fn run(&mut self, running: &AtomicBool) -> Result<StopReason, BridgeError> {
        let result = self.pump(running);
        self.state = RunState::Terminating;
        match &result {
            Ok(reason) => info!(?reason, stats = ?self.stats, "bridge loop stopped"),
            Err(e) => warn!(stats = ?self.stats, "bridge loop aborted: {e}"),
        }
        result
    }

    fn pump(&mut self, running: &AtomicBool) -> Result<StopReason, BridgeError> {
        loop {
            if !running.load(Ordering::SeqCst) {
                return Ok(StopReason::Interrupted);
            }

            match self.source.read() {
                Ok(ReadOutcome::Sample(sample)) => self.accept(&sample),
                Ok(ReadOutcome::NoSample) => {
                    self.stats.empty_polls += 1;
                }
                Ok(ReadOutcome::Exhausted) => return Ok(StopReason::SourceExhausted),
                Err(SourceError::Malformed(detail)) => {
                    self.stats.malformed_reads += 1;
                    warn!("skipping malformed digitizer input: {detail}");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn accept(&mut self, sample: &Sample) {
        if self.state == RunState::Idle {
            info!("first sample received, streaming");
            self.state = RunState::Streaming;
        }
        self.stats.samples += 1;
        let burst = translate(sample, self.threshold);
        self.emit_burst(&burst);
        if self.stats.samples % 1000 == 0 {
            debug!(stats = ?self.stats, "bridge progress");
        }
    }

    /// Writes every event of `burst`.  A failed write is logged and skipped;
    /// the rest of the burst is still written.
    pub fn emit_burst(&mut self, burst: &Burst) {
        for event in burst {
            match self.device.emit(event) {
                Ok(()) => self.stats.events_written += 1,
                Err(e) => {
                    self.stats.write_failures += 1;
                    warn!(?event, "failed to write synthetic event: {e}");
                }
            }
        }
    }

    /// Destroys the device, then closes the source.
    ///
    /// # Errors
    ///
    /// Returns the sink's error if the device could not be destroyed cleanly.
    /// The source is closed regardless.
    pub fn shutdown(mut self) -> Result<BridgeStats, SinkError> {
        self.state = RunState::Terminating;
        let destroyed = self.device.destroy();
        self.source.close();
        info!("sample source closed");
        destroyed.map(|()| self.stats)
    }
}

/// Registers the virtual device for `source` and runs the bridge to completion.
///
/// The source is closed and the device destroyed on every path out of this
/// function, including registration failure.
///
/// # Errors
///
/// Returns [`BridgeError::Registration`] if setup fails (no sample is read in
/// that case), or [`BridgeError::Source`] for a fatal read error.
pub fn run_bridge<S, D, F>(
    mut source: S,
    open_sink: F,
    config: &BridgeConfig,
    running: &AtomicBool,
) -> Result<StopReason, BridgeError>
where
    S: SampleSource,
    D: VirtualInputSink,
    F: FnOnce() -> Result<D, SinkError>,
{
    let ranges = source.device_ranges();
    info!(?ranges, "digitizer ranges");

    let device = match register_device(open_sink, &ranges, &config.metadata) {
        Ok(device) => device,
        Err(e) => {
            source.close();
            return Err(e.into());
        }
    };

    let mut bridge = TabletBridge::new(source, device, config.pressure_threshold);
    let outcome = bridge.run(running);
    if let Err(e) = bridge.shutdown() {
        warn!("virtual device teardown reported an error: {e}");
    }
    outcome
}

/// Waits up to `delay`, returning early (with `false`) if `running` is cleared.
pub fn settle(delay: Duration, running: &AtomicBool) -> bool {
    if delay.is_zero() {
        return running.load(Ordering::SeqCst);
    }
    info!("waiting {delay:?} for the input stack to settle");
    let deadline = Instant::now() + delay;
    let step = Duration::from_millis(50);
    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(step.min(deadline - now));
    }
    false
}

// ── Tests ─────────────────────────────────────────────────────────────────────
