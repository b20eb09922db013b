//! Application layer for tablet-bridge.
//!
//! Use cases that drive the two ports defined here:
//!
//! - **`register_device`** – declares the virtual tablet's capabilities, axis
//!   ranges and identity on a [`register_device::VirtualInputSink`] and hands
//!   back a guard that destroys the device exactly once.
//!
//! - **`run_bridge`** – the loop that reads samples from a
//!   [`run_bridge::SampleSource`], translates them and writes the resulting
//!   event bursts until asked to stop.
//!
//! Neither module touches the OS.  Concrete adapters live in
//! `infrastructure`.

pub mod register_device;
pub mod run_bridge;
