//! Infrastructure layer for tablet-bridge.
//!
//! OS-facing adapters for the application ports.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `tablet_core`, but MUST NOT be imported by the `application` or `domain`
//! layers outside of tests.
//!
//! # Sub-modules
//!
//! - **`virtual_device`** – `VirtualInputSink` implementations.  On Linux the
//!   sink is a uinput device; a recording mock is provided for tests.
//!
//! - **`sample_source`** – `SampleSource` implementations.  On Unix the serial
//!   source talks ISDV4 to the digitizer; a scripted mock is provided for tests.
//!
//! - **`config_file`** – loads the optional TOML config file.

pub mod config_file;
pub mod sample_source;
pub mod virtual_device;
