//! Bus abstraction
//!
//! A bus backend moves raw SMBus "I2C block" transfers between the host and
//! the boards. It knows nothing about frames, checksums or retries; those
//! live in [`crate::protocol`].

mod address;
mod traits;

pub use address::DeviceAddress;
pub use traits::{BusFeatures, RegisterBus, MAX_BLOCK_LEN};
