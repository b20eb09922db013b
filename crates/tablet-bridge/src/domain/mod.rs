//! Domain layer for tablet-bridge.
//!
//! Plain configuration types with no I/O.  The binary fills them in from the
//! command line and the optional config file; the application layer only ever
//! sees the finished [`BridgeConfig`].

pub mod config;

pub use config::{BridgeConfig, DeviceMetadata, DeviceType, DeviceTypeError};
