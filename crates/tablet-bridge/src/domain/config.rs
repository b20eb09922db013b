//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It is built once at startup from CLI arguments, environment variables and
//! the optional TOML file, and is never re-read while the bridge runs.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tablet_core::event::codes::BUS_RS232;
use tablet_core::PressureThreshold;
use thiserror::Error;

/// Error returned for an unknown `-t` device type tag.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported device type '{0}' (supported: tpc)")]
pub struct DeviceTypeError(pub String);

/// The digitizer family the sample source speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// Wacom ISDV4 serial digitizer found in Tablet PCs.
    Tpc,
}

impl FromStr for DeviceType {
    type Err = DeviceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tpc" => Ok(DeviceType::Tpc),
            _ => Err(DeviceTypeError(s.to_string())),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Tpc => write!(f, "tpc"),
        }
    }
}

/// Identity the virtual device presents to the input stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceMetadata {
    pub name: String,
    pub bus: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

impl DeviceMetadata {
    pub const DEFAULT_NAME: &'static str = "wacom-input";
    /// Wacom's USB vendor ID, so libwacom-aware stacks treat us as a Wacom pen.
    pub const WACOM_VENDOR: u16 = 0x056a;
}

impl Default for DeviceMetadata {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            bus: BUS_RS232,
            vendor: Self::WACOM_VENDOR,
            product: 0xffff,
            version: 1,
        }
    }
}

/// All runtime configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use tablet_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.device_node.to_str(), Some("/dev/ttyS0"));
/// assert_eq!(cfg.pressure_threshold.get(), 20);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub device_type: DeviceType,
    /// Serial device node the digitizer is attached to.
    pub device_node: PathBuf,
    /// Pressure above which `BTN_TOUCH` is reported as pressed.
    pub pressure_threshold: PressureThreshold,
    /// Serial line speed.
    pub baud_rate: u32,
    /// Time to wait after opening the digitizer and before creating the
    /// virtual device.  Some input stacks miss devices that appear too early
    /// during boot.
    pub startup_delay: Duration,
    pub metadata: DeviceMetadata,
}

impl BridgeConfig {
    pub const DEFAULT_DEVICE_NODE: &'static str = "/dev/ttyS0";
    pub const DEFAULT_BAUD_RATE: u32 = 19200;
}

impl Default for BridgeConfig {
    /// | Field              | Default        |
    /// |--------------------|----------------|
    /// | device_type        | `tpc`          |
    /// | device_node        | `/dev/ttyS0`   |
    /// | pressure_threshold | 20             |
    /// | baud_rate          | 19200          |
    /// | startup_delay      | 0              |
    /// | metadata.name      | `wacom-input`  |
    fn default() -> Self {
        Self {
            device_type: DeviceType::Tpc,
            device_node: PathBuf::from(Self::DEFAULT_DEVICE_NODE),
            pressure_threshold: PressureThreshold::default(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            startup_delay: Duration::ZERO,
            metadata: DeviceMetadata::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_parses_tpc_case_insensitively() {
        assert_eq!("tpc".parse::<DeviceType>(), Ok(DeviceType::Tpc));
        assert_eq!("TPC".parse::<DeviceType>(), Ok(DeviceType::Tpc));
    }

    #[test]
    fn test_device_type_rejects_unknown_tag() {
        let err = "cintiq".parse::<DeviceType>().unwrap_err();
        assert_eq!(err, DeviceTypeError("cintiq".to_string()));
        assert!(err.to_string().contains("supported: tpc"));
    }

    #[test]
    fn test_default_metadata_identifies_as_wacom_serial() {
        let meta = DeviceMetadata::default();
        assert_eq!(meta.name, "wacom-input");
        assert_eq!(meta.bus, 0x13);
        assert_eq!(meta.vendor, 0x056a);
        assert_eq!(meta.product, 0xffff);
        assert_eq!(meta.version, 1);
    }

    #[test]
    fn test_default_config() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.device_type, DeviceType::Tpc);
        assert_eq!(cfg.baud_rate, 19200);
        assert_eq!(cfg.startup_delay, Duration::ZERO);
    }
}
