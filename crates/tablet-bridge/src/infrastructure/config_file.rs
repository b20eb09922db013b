//! Optional TOML configuration file.
//!
//! Every field is optional.  A missing field falls back to whatever a lower
//! layer provides: command-line flags and environment variables win over the
//! file, and the file wins over the built-in defaults in
//! [`BridgeConfig::default`].
//!
//! ```toml
//! device_type = "tpc"
//! device_node = "/dev/ttyS4"
//! pressure_threshold = 30
//! baud_rate = 38400
//! startup_delay_ms = 2000
//! device_name = "wacom-input"
//! log_level = "debug"
//! ```
//!
//! The same [`FileConfig`] shape is used for the command-line layer, so the
//! merge is just [`FileConfig::overlay`] followed by
//! [`FileConfig::into_bridge_config`], which validates every value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tablet_core::{PressureThreshold, ThresholdError};
use thiserror::Error;

use crate::domain::{BridgeConfig, DeviceType, DeviceTypeError};

/// Serial line speeds the ISDV4 digitizers are known to use.
pub const SUPPORTED_BAUD_RATES: [u32; 3] = [9600, 19200, 38400];

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pressure threshold: {0}")]
    Threshold(#[from] ThresholdError),

    #[error(transparent)]
    DeviceType(#[from] DeviceTypeError),

    #[error("unsupported baud rate {0} (supported: 9600, 19200, 38400)")]
    BaudRate(u32),
}

/// One layer of configuration: the TOML file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub device_type: Option<String>,
    pub device_node: Option<PathBuf>,
    pub pressure_threshold: Option<i32>,
    pub baud_rate: Option<u32>,
    pub startup_delay_ms: Option<u64>,
    /// Name of the virtual device as seen by the input stack.
    pub device_name: Option<String>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Returns `self` with every field that `top` sets replaced by `top`'s
    /// value.
    pub fn overlay(self, top: FileConfig) -> FileConfig {
        FileConfig {
            device_type: top.device_type.or(self.device_type),
            device_node: top.device_node.or(self.device_node),
            pressure_threshold: top.pressure_threshold.or(self.pressure_threshold),
            baud_rate: top.baud_rate.or(self.baud_rate),
            startup_delay_ms: top.startup_delay_ms.or(self.startup_delay_ms),
            device_name: top.device_name.or(self.device_name),
            log_level: top.log_level.or(self.log_level),
        }
    }

    /// Validates the layer and fills unset fields from the defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid value.
    pub fn into_bridge_config(self) -> Result<BridgeConfig, ConfigError> {
        let mut cfg = BridgeConfig::default();

        if let Some(tag) = self.device_type {
            cfg.device_type = tag.parse::<DeviceType>()?;
        }
        if let Some(node) = self.device_node {
            cfg.device_node = node;
        }
        if let Some(t) = self.pressure_threshold {
            cfg.pressure_threshold = PressureThreshold::new(t)?;
        }
        if let Some(baud) = self.baud_rate {
            if !SUPPORTED_BAUD_RATES.contains(&baud) {
                return Err(ConfigError::BaudRate(baud));
            }
            cfg.baud_rate = baud;
        }
        if let Some(ms) = self.startup_delay_ms {
            cfg.startup_delay = Duration::from_millis(ms);
        }
        if let Some(name) = self.device_name {
            cfg.metadata.name = name;
        }
        Ok(cfg)
    }
}

/// Reads and parses the config file at `path`.
///
/// Unlike a default config location, a path given explicitly must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if the TOML is malformed or has unknown keys.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
