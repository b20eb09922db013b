//! Domain entities for tablet-bridge.
//!
//! Pure data types with no infrastructure dependencies.
//!
//! # What lives here? (for beginners)
//!
//! - **`sample`** – One normalized digitizer reading.  Produced by whatever
//!   backend decodes the hardware protocol, consumed by the bridge.
//! - **`ranges`** – The min/max of each absolute axis the digitizer reports.
//!   These become the axis ranges of the virtual device.
//! - **`threshold`** – The pressure level above which the pen counts as
//!   touching the surface.

pub mod ranges;
pub mod sample;
pub mod threshold;
