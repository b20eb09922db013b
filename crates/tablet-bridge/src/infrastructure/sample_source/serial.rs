//! ISDV4 serial digitizer source.
//!
//! Wacom Tablet PC digitizers sit behind a plain UART (`/dev/ttyS*`) and
//! speak a small binary protocol: single-character commands from the host,
//! fixed-size packets from the tablet.  Decoding lives in
//! [`tablet_core::protocol::isdv4`]; this module owns the file descriptor.
//!
//! # Handshake
//!
//! ```text
//!   host: "0"            stop streaming, then let the line go quiet
//!   host: (flush)        drop anything already buffered
//!   host: "*"            query
//!   tablet: 11 bytes     max x / max y / max pressure / firmware
//!   host: "1"            start streaming pen packets
//! ```
//!
//! # Reads
//!
//! The port is opened non-blocking.  Each [`SampleSource::read`] waits in
//! `poll(2)` for at most [`POLL_TIMEOUT_MS`], so a cleared `running` flag is
//! noticed within that bound even when the pen is idle.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

use tablet_core::protocol::isdv4::{CMD_QUERY, CMD_START, CMD_STOP};
use tablet_core::{DeviceRanges, Isdv4Capabilities, Isdv4Decoder, Isdv4Packet, Sample};
use tracing::{debug, info, trace, warn};

use crate::application::run_bridge::{ReadOutcome, SampleSource, SourceError};
use crate::domain::{BridgeConfig, DeviceType};

/// Upper bound on a single `read` wait.
pub const POLL_TIMEOUT_MS: i32 = 100;
/// How long to wait for the query response during setup.
const QUERY_TIMEOUT: Duration = Duration::from_secs(1);
/// Quiet time after the stop command before the line is flushed.
const STOP_SETTLE: Duration = Duration::from_millis(200);
const READ_CHUNK: usize = 64;

fn speed_for(baud: u32) -> io::Result<libc::speed_t> {
    match baud {
        9600 => Ok(libc::B9600),
        19200 => Ok(libc::B19200),
        38400 => Ok(libc::B38400),
        other => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unsupported baud rate {other}"),
        )),
    }
}

fn cvt(rc: libc::c_int) -> io::Result<()> {
    if rc < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Puts the TTY into raw 8N1 mode at `baud`.
fn configure_line(fd: RawFd, baud: u32) -> io::Result<()> {
    let speed = speed_for(baud)?;
    // SAFETY: `fd` is an open TTY owned by the caller and `tio` is a plain
    // C struct filled in by tcgetattr before use.
    unsafe {
        let mut tio: libc::termios = std::mem::zeroed();
        cvt(libc::tcgetattr(fd, &mut tio))?;
        libc::cfmakeraw(&mut tio);
        tio.c_cflag |= libc::CLOCAL | libc::CREAD | libc::CS8;
        tio.c_cflag &= !(libc::CSTOPB | libc::PARENB);
        cvt(libc::cfsetispeed(&mut tio, speed))?;
        cvt(libc::cfsetospeed(&mut tio, speed))?;
        cvt(libc::tcsetattr(fd, libc::TCSANOW, &tio))?;
    }
    Ok(())
}

/// Waits up to `timeout_ms` for `fd` to become readable.
fn poll_readable(fd: RawFd, timeout_ms: i32) -> io::Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: `pfd` is a single valid pollfd for the duration of the call.
    let rc = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if rc < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    Ok(rc > 0)
}

fn is_tty(fd: RawFd) -> bool {
    // SAFETY: isatty only inspects the descriptor.
    unsafe { libc::isatty(fd) == 1 }
}

/// A [`SampleSource`] reading an ISDV4 digitizer on a serial port.
pub struct SerialSampleSource {
    port: Option<File>,
    decoder: Isdv4Decoder,
    queued: VecDeque<Sample>,
    capabilities: Isdv4Capabilities,
}

impl SerialSampleSource {
    /// Opens `config.device_node`, configures the line and runs the
    /// stop/query/start handshake.
    ///
    /// # Errors
    ///
    /// [`SourceError::Io`] if the node cannot be opened or configured, and
    /// [`SourceError::NoResponse`] if the tablet does not answer the query.
    pub fn open(config: &BridgeConfig) -> Result<Self, SourceError> {
        let DeviceType::Tpc = config.device_type;
        debug!(device_type = %config.device_type, "opening {}", config.device_node.display());

        let port = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&config.device_node)?;
        let tty = is_tty(port.as_raw_fd());
        if tty {
            configure_line(port.as_raw_fd(), config.baud_rate)?;
            debug!(baud = config.baud_rate, "serial line configured (raw 8N1)");
        } else {
            debug!("{} is not a tty, skipping line setup", config.device_node.display());
        }

        let source = Self::start(port, tty)?;
        info!(
            device = %config.device_node.display(),
            firmware = source.capabilities.firmware_version,
            "ISDV4 digitizer ready"
        );
        Ok(source)
    }

    /// Runs the handshake on an already opened port.
    fn start(port: File, tty: bool) -> Result<Self, SourceError> {
        let mut source = Self {
            port: Some(port),
            decoder: Isdv4Decoder::new(),
            queued: VecDeque::new(),
            capabilities: Isdv4Capabilities {
                max_x: 0,
                max_y: 0,
                max_pressure: 0,
                firmware_version: 0,
            },
        };

        source.send(CMD_STOP)?;
        std::thread::sleep(STOP_SETTLE);
        if tty {
            if let Some(port) = &source.port {
                // SAFETY: flushing an open TTY descriptor.
                cvt(unsafe { libc::tcflush(port.as_raw_fd(), libc::TCIOFLUSH) })?;
            }
        }
        source.decoder.reset();

        source.send(CMD_QUERY)?;
        source.capabilities = source.await_query(QUERY_TIMEOUT)?;
        debug!(capabilities = ?source.capabilities, "query response");

        source.send(CMD_START)?;
        Ok(source)
    }

    pub fn capabilities(&self) -> Isdv4Capabilities {
        self.capabilities
    }

    fn port(&mut self) -> Result<&mut File, SourceError> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port closed").into())
    }

    fn send(&mut self, command: &[u8]) -> Result<(), SourceError> {
        let port = self.port()?;
        port.write_all(command)?;
        trace!(?command, "isdv4 command sent");
        Ok(())
    }

    /// Reads one chunk into the decoder.  `Ok(None)` means nothing was ready.
    fn fill(&mut self, timeout_ms: i32) -> Result<Option<usize>, SourceError> {
        let port = self.port()?;
        if !poll_readable(port.as_raw_fd(), timeout_ms)? {
            return Ok(None);
        }
        let mut buf = [0u8; READ_CHUNK];
        let n = match port.read(&mut buf) {
            Ok(n) => n,
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };
        self.decoder.push(&buf[..n]);
        Ok(Some(n))
    }

    fn await_query(&mut self, timeout: Duration) -> Result<Isdv4Capabilities, SourceError> {
        let deadline = Instant::now() + timeout;
        loop {
            while let Some(packet) = self.decoder.next_packet() {
                match packet {
                    Ok(Isdv4Packet::Query(caps)) => return Ok(caps),
                    Ok(Isdv4Packet::Pen(_)) => trace!("pen packet before query response, ignored"),
                    Err(e) => debug!("while waiting for query response: {e}"),
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(SourceError::NoResponse(format!(
                    "no query response within {timeout:?}"
                )));
            }
            let remaining = (deadline - now).as_millis().min(i32::MAX as u128) as i32;
            if let Some(0) = self.fill(remaining.max(1))? {
                return Err(SourceError::NoResponse(
                    "end of stream before query response".into(),
                ));
            }
        }
    }

    /// Moves every complete packet out of the decoder.  Returns the first
    /// protocol error seen, if any.
    fn drain_decoder(&mut self) -> Option<String> {
        let mut first_error = None;
        while let Some(packet) = self.decoder.next_packet() {
            match packet {
                Ok(Isdv4Packet::Pen(sample)) => self.queued.push_back(sample),
                Ok(Isdv4Packet::Query(_)) => debug!("unsolicited query response ignored"),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e.to_string());
                    } else {
                        debug!("further malformed packet: {e}");
                    }
                }
            }
        }
        first_error
    }
}

impl SampleSource for SerialSampleSource {
    fn device_ranges(&self) -> DeviceRanges {
        self.capabilities.ranges()
    }

    fn read(&mut self) -> Result<ReadOutcome, SourceError> {
        if let Some(sample) = self.queued.pop_front() {
            return Ok(ReadOutcome::Sample(sample));
        }
        match self.fill(POLL_TIMEOUT_MS)? {
            None => return Ok(ReadOutcome::NoSample),
            Some(0) => return Ok(ReadOutcome::Exhausted),
            Some(_) => {}
        }

        let error = self.drain_decoder();
        match (self.queued.pop_front(), error) {
            (Some(sample), Some(e)) => {
                warn!("skipping malformed digitizer input: {e}");
                Ok(ReadOutcome::Sample(sample))
            }
            (Some(sample), None) => Ok(ReadOutcome::Sample(sample)),
            (None, Some(e)) => Err(SourceError::Malformed(e)),
            (None, None) => Ok(ReadOutcome::NoSample),
        }
    }

    fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.write_all(CMD_STOP) {
                warn!("failed to send stop command to digitizer: {e}");
            }
            debug!(
                discarded = self.decoder.discarded(),
                "serial port released"
            );
        }
    }
}

impl Drop for SerialSampleSource {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
