//! Virtual input device implementations.
//!
//! The uinput sink is only compiled on Linux.

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;
