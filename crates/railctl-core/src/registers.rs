//! Register map
//!
//! Register numbers and data lengths are a fixed contract with the board
//! firmware. Lengths count data bytes only; framing adds the echoed id and
//! the checksum.

/// Inventory structure version
pub const INVENTORY_VERSION: u8 = 0;
/// Inventory structure version length
pub const INVENTORY_VERSION_LEN: usize = 1;

/// Bus address as configured in the board firmware
pub const BUS_ADDRESS: u8 = 1;
/// Bus address length
pub const BUS_ADDRESS_LEN: usize = 1;

/// Board type code
pub const BOARD_TYPE: u8 = 2;
/// Board type length
pub const BOARD_TYPE_LEN: usize = 1;

/// Free-text board description
pub const BOARD_DESCRIPTION: u8 = 3;
/// Board description length
pub const BOARD_DESCRIPTION_LEN: usize = 16;

/// Board hardware version
pub const BOARD_VERSION: u8 = 4;
/// Board version length
pub const BOARD_VERSION_LEN: usize = 1;

/// Communication-layer firmware version string
pub const COMM_SW_VERSION: u8 = 10;
/// Communication firmware version length
pub const COMM_SW_VERSION_LEN: usize = 9;

/// Inventory-layer firmware version string
pub const INVENTORY_SW_VERSION: u8 = 11;
/// Inventory firmware version length
pub const INVENTORY_SW_VERSION_LEN: usize = 9;

/// Application firmware version string
pub const APP_SW_VERSION: u8 = 20;
/// Application firmware version length
pub const APP_SW_VERSION_LEN: usize = 9;

/// Light output level: `[pin, level]`
pub const LIGHT_POWER_LEVEL: u8 = 30;

/// Throttle power level: `[channel, 0..=100]`
pub const THROTTLE_POWER: u8 = 40;
/// Throttle direction: `[channel, 0 = forward | 1 = reverse]`
pub const THROTTLE_DIRECTION: u8 = 41;
/// Throttle momentum: `[channel, 0 | 1]`
pub const THROTTLE_MOMENTUM: u8 = 42;
/// Measured speed, one byte per channel
pub const THROTTLE_SPEED: u8 = 43;
/// Throttle speed length
pub const THROTTLE_SPEED_LEN: usize = 2;

/// Turnout position: `[turnout, 0 = normal | 1 = reverse]`
pub const TURNOUT_POSITION: u8 = 50;

/// Sequence number of the last write the device applied
pub const WRITE_SEQUENCE: u8 = 98;
/// Write sequence length
pub const WRITE_SEQUENCE_LEN: usize = 1;

/// Loopback/status register, read raw without framing checks
pub const LOOPBACK: u8 = 99;
/// Raw bytes read by a loopback probe
pub const LOOPBACK_LEN: usize = 2;

/// Scratch register for block read/write diagnostics
pub const DIAG_BLOCK: u8 = 100;
/// Diagnostic block length
pub const DIAG_BLOCK_LEN: usize = 16;

/// Board type codes reported by [`BOARD_TYPE`]
pub mod board_type {
    /// Locomotive throttle board
    pub const THROTTLE: u8 = 1;
    /// Lighting board
    pub const LIGHTS: u8 = 2;
    /// Track switch (turnout) board
    pub const SWITCHES: u8 = 3;
}
