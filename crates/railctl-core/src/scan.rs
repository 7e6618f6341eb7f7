//! Bus enumeration
//!
//! The bus backend produces a presence grid in the format printed by
//! `i2cdetect -y <bus>`:
//!
//! ```text
//!      0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f
//! 00:                         08 09 -- -- -- -- -- --
//! 10: -- -- -- -- -- -- -- -- -- -- -- -- -- -- -- --
//! ```
//!
//! Row 0 is a column header and column 0 of every other row is a row label.
//! `--` marks an empty slot; any other two-digit hex token is a responding
//! device.

use crate::bus::{DeviceAddress, RegisterBus};
use crate::error::Error;

/// Placeholder printed for an address with no device
pub const ABSENT: &str = "--";

/// Parse a presence grid into addresses, in scan order
pub fn parse_detect_grid(grid: &str) -> Vec<DeviceAddress> {
    let mut found = Vec::new();

    for line in grid.lines().skip(1) {
        for token in line.split_whitespace().skip(1) {
            if token == ABSENT {
                continue;
            }
            match DeviceAddress::from_hex_token(token) {
                Some(address) => found.push(address),
                // "UU" is a slot claimed by a kernel driver
                None => log::debug!("scan: ignoring grid cell {:?}", token),
            }
        }
    }

    found
}

/// Result of one discovery cycle
#[derive(Debug, Default)]
pub struct Enumeration {
    /// Responding addresses in ascending scan order
    pub addresses: Vec<DeviceAddress>,
    /// Set when the probe could not run; `addresses` is then empty
    pub probe_error: Option<Error>,
}

impl Enumeration {
    /// Whether the probe ran
    pub fn is_ok(&self) -> bool {
        self.probe_error.is_none()
    }
}

/// Run the bus probe and parse its output
///
/// A probe failure is not retried; it yields an empty list and is reported
/// through [`Enumeration::probe_error`].
pub fn enumerate<B: RegisterBus + ?Sized>(bus: &mut B) -> Enumeration {
    match bus.detect() {
        Ok(grid) => {
            let addresses = parse_detect_grid(&grid);
            log::info!("Found {} device(s) on the bus", addresses.len());
            Enumeration {
                addresses,
                probe_error: None,
            }
        }
        Err(e) => {
            log::warn!("Bus scan failed: {}", e);
            Enumeration {
                addresses: Vec::new(),
                probe_error: Some(e),
            }
        }
    }
}
