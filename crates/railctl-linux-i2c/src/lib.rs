//! railctl-linux-i2c - Linux i2c-dev bus backend
//!
//! This crate talks to layout boards through the kernel's `/dev/i2c-N`
//! character devices, using the SMBus "I2C block data" transfers for
//! register reads and writes and `i2cdetect` for bus scans.
//!
//! # Example
//!
//! ```no_run
//! use railctl_linux_i2c::{LinuxI2c, LinuxI2cConfig};
//! use railctl_core::access::RegisterAccess;
//! use railctl_core::session::BusSession;
//!
//! let bus = LinuxI2c::open(&LinuxI2cConfig::for_bus(1))?;
//! let mut session = BusSession::new(bus);
//! let found = session.enumerate();
//! println!("{} device(s)", found.addresses.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with railctl CLI
//!
//! ```bash
//! # Scan bus 1 (Raspberry Pi header pins)
//! railctl scan -b linux_i2c:bus=1
//!
//! # Use an explicit device node and wait for the bus to settle
//! railctl inventory -b linux_i2c:dev=/dev/i2c-1,settle=1000
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with i2c-dev support (`CONFIG_I2C_CHARDEV`)
//! - Read/write access to `/dev/i2c-N` (usually the `i2c` group)
//! - `i2cdetect` from i2c-tools for bus scans

pub mod detect;
pub mod device;
pub mod error;

pub use device::{parse_options, I2cFunctionality, LinuxI2c, LinuxI2cConfig, DEFAULT_DETECT_COMMAND};
pub use error::{LinuxI2cError, Result};

/// Open a Linux I2C bus and return a boxed RegisterBus
///
/// # Example Options
///
/// - `bus=1` - bus number, opens `/dev/i2c-1`
/// - `dev=/dev/i2c-1` - explicit device path (not together with `bus`)
/// - `i2cdetect=/usr/sbin/i2cdetect` - Optional: detect command
/// - `settle=1000` - Optional: pause after opening, in ms
pub fn open_linux_i2c(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn railctl_core::bus::RegisterBus + Send>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let bus = LinuxI2c::open(&config)?;
    Ok(Box::new(bus))
}
