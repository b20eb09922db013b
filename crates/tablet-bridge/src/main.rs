//! tablet-bridge entry point.
//!
//! Reads pen samples from a serial ISDV4 digitizer and re-emits them on a
//! uinput virtual tablet until interrupted.
//!
//! # Usage
//!
//! ```text
//! tablet-bridge [OPTIONS]
//!
//! Options:
//!   -t, --device-type <TYPE>            Digitizer type [default: tpc]
//!   -d, --device <PATH>                 Serial device node [default: /dev/ttyS0]
//!   -p, --pressure-threshold <N>        Touch threshold, >= 1 [default: 20]
//!   -b, --baud <RATE>                   9600, 19200 or 38400 [default: 19200]
//!       --startup-delay-ms <MS>         Wait before registering [default: 0]
//!   -c, --config <FILE>                 Optional TOML config file
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                    | Flag                   |
//! |-----------------------------|------------------------|
//! | `TABLET_DEVICE_TYPE`        | `--device-type`        |
//! | `TABLET_DEVICE`             | `--device`             |
//! | `TABLET_PRESSURE_THRESHOLD` | `--pressure-threshold` |
//! | `TABLET_BAUD`               | `--baud`               |
//! | `TABLET_STARTUP_DELAY_MS`   | `--startup-delay-ms`   |
//! | `TABLET_BRIDGE_CONFIG`      | `--config`             |
//!
//! Flags and environment variables win over the config file, which wins over
//! the built-in defaults.
//!
//! # Shutdown
//!
//! SIGINT and SIGTERM only clear a shared `running` flag.  The bridge loop
//! runs on a blocking worker thread, notices the flag within one poll
//! interval, destroys the virtual device, closes the serial port and returns.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tablet_bridge::application::run_bridge::StopReason;
use tablet_bridge::domain::BridgeConfig;
use tablet_bridge::infrastructure::config_file::{load_config, FileConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Expose a serial pen digitizer as a uinput virtual tablet.
#[derive(Debug, Parser)]
#[command(name = "tablet-bridge", version)]
struct Cli {
    /// Digitizer type.  Only `tpc` (Wacom ISDV4 Tablet PC) is supported.
    /// [default: tpc]
    #[arg(short = 't', long = "device-type", env = "TABLET_DEVICE_TYPE")]
    device_type: Option<String>,

    /// Serial device node the digitizer is attached to.  [default: /dev/ttyS0]
    #[arg(short = 'd', long = "device", env = "TABLET_DEVICE")]
    device: Option<PathBuf>,

    /// Pressure above which the pen counts as touching.  [default: 20]
    #[arg(
        short = 'p',
        long = "pressure-threshold",
        env = "TABLET_PRESSURE_THRESHOLD",
        value_parser = clap::value_parser!(i32).range(1..)
    )]
    pressure_threshold: Option<i32>,

    /// Serial line speed: 9600, 19200 or 38400.  [default: 19200]
    #[arg(short = 'b', long = "baud", env = "TABLET_BAUD")]
    baud: Option<u32>,

    /// Milliseconds to wait after opening the digitizer before the virtual
    /// device is created.  [default: 0]
    #[arg(long = "startup-delay-ms", env = "TABLET_STARTUP_DELAY_MS")]
    startup_delay_ms: Option<u64>,

    /// Optional TOML config file.
    #[arg(short = 'c', long = "config", env = "TABLET_BRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

impl Cli {
    /// The command-line layer, in the same shape as the config file.
    fn overrides(&self) -> FileConfig {
        FileConfig {
            device_type: self.device_type.clone(),
            device_node: self.device.clone(),
            pressure_threshold: self.pressure_threshold,
            baud_rate: self.baud,
            startup_delay_ms: self.startup_delay_ms,
            device_name: None,
            log_level: None,
        }
    }

    /// Loads the config file (if any) and lays the command line over it.
    ///
    /// # Errors
    ///
    /// Returns an error if `--config` names a file that cannot be read or
    /// parsed.
    fn into_settings(self) -> anyhow::Result<FileConfig> {
        let file = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("failed to load config file {}", path.display()))?,
            None => FileConfig::default(),
        };
        Ok(file.overlay(self.overrides()))
    }
}

/// `RUST_LOG` wins; otherwise the config file's `log_level`, otherwise `info`.
fn init_tracing(log_level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves once SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
                    _ = term.recv() => info!("received SIGTERM"),
                }
                return;
            }
            Err(e) => warn!("cannot listen for SIGTERM, only SIGINT will stop the bridge: {e}"),
        }
    }
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received SIGINT"),
        Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
    }
}

#[cfg(target_os = "linux")]
fn run(config: BridgeConfig, running: &AtomicBool) -> anyhow::Result<StopReason> {
    use tablet_bridge::application::run_bridge::{run_bridge, settle, SampleSource};
    use tablet_bridge::infrastructure::sample_source::serial::SerialSampleSource;
    use tablet_bridge::infrastructure::virtual_device::linux::UinputSink;

    let mut source = SerialSampleSource::open(&config)
        .with_context(|| format!("failed to open digitizer on {}", config.device_node.display()))?;

    if !settle(config.startup_delay, running) {
        source.close();
        return Ok(StopReason::Interrupted);
    }

    let reason = run_bridge(source, UinputSink::open, &config, running)?;
    Ok(reason)
}

#[cfg(not(target_os = "linux"))]
fn run(_config: BridgeConfig, _running: &AtomicBool) -> anyhow::Result<StopReason> {
    anyhow::bail!("tablet-bridge needs Linux uinput and cannot run on this platform")
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// The runtime only hosts the signal listener; the bridge itself is blocking
/// I/O on a `spawn_blocking` worker, so one thread is enough.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.into_settings()?;
    init_tracing(settings.log_level.as_deref());

    let config = settings
        .into_bridge_config()
        .context("invalid configuration")?;
    info!(
        "tablet-bridge starting: type={}, device={}, threshold={}, baud={}",
        config.device_type,
        config.device_node.display(),
        config.pressure_threshold,
        config.baud_rate
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        shutdown_signal().await;
        running_clone.store(false, Ordering::SeqCst);
    });

    let worker_running = Arc::clone(&running);
    let reason = tokio::task::spawn_blocking(move || run(config, &worker_running))
        .await
        .context("bridge worker panicked")??;

    match reason {
        StopReason::Interrupted => info!("tablet-bridge stopped"),
        StopReason::SourceExhausted => info!("digitizer stream ended, tablet-bridge stopped"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
