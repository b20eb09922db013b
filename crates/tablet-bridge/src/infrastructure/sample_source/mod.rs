//! Sample source implementations.

pub mod mock;

#[cfg(unix)]
pub mod serial;
