//! tablet-bridge library crate.
//!
//! Turns a serial pen digitizer into a Linux virtual input device.
//!
//! # Architecture
//!
//! ```text
//! ISDV4 digitizer (/dev/ttyS*)
//!         ↓  serial bytes
//! [tablet-bridge]
//!   ├── domain/           BridgeConfig, DeviceType, DeviceMetadata
//!   ├── application/      register_device (capability setup),
//!   │                     run_bridge (sample → burst loop)
//!   └── infrastructure/
//!         ├── sample_source/   ISDV4 serial port adapter (+ mock)
//!         ├── virtual_device/  uinput adapter (+ mock)
//!         └── config_file      optional TOML settings
//!         ↓  input_event
//! /dev/uinput → evdev → X11 / Wayland / Android input stack
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `tablet-core`, and defines the
//!   `SampleSource` and `VirtualInputSink` ports.
//! - `infrastructure` implements those ports on top of the OS.

/// Domain layer: configuration types (no I/O).
pub mod domain;

/// Application layer: device registration and the bridge loop.
pub mod application;

/// Infrastructure layer: serial port, uinput, and config file adapters.
pub mod infrastructure;
