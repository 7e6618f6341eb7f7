//! Bus trait definitions

use super::DeviceAddress;
use crate::error::Result;
use bitflags::bitflags;

/// Largest SMBus block transfer in bytes
pub const MAX_BLOCK_LEN: usize = 32;

bitflags! {
    /// Bus feature flags
    ///
    /// Backends report which transfer types the adapter supports so the
    /// transport can fail early instead of retrying something that can
    /// never work.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFeatures: u32 {
        /// SMBus "read I2C block data"
        const BLOCK_READ  = 1 << 0;
        /// SMBus "write I2C block data"
        const BLOCK_WRITE = 1 << 1;
        /// Can produce an `i2cdetect`-style presence grid
        const DETECT      = 1 << 2;

        /// Everything the register protocol needs
        const FULL = Self::BLOCK_READ.bits() | Self::BLOCK_WRITE.bits() | Self::DETECT.bits();
    }
}

impl Default for BusFeatures {
    fn default() -> Self {
        BusFeatures::empty()
    }
}

/// Register bus trait
///
/// Represents a host adapter that can address a device and move a block of
/// bytes to or from one of its registers. The register number is sent as
/// the SMBus command byte.
///
/// Implementations report every transport-level failure (no ACK, arbitration
/// lost, line fault) as [`crate::Error::BusIo`] so the protocol layer can
/// treat it as retryable.
pub trait RegisterBus {
    /// Get the features supported by this bus
    fn features(&self) -> BusFeatures;

    /// Read `len` bytes from `register` on the device at `address`
    ///
    /// Returns the bytes actually received, which may be fewer than `len`
    /// on a misbehaving bus. The caller validates the length.
    fn read_block(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>>;

    /// Write `data` to `register` on the device at `address`
    fn write_block(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()>;

    /// Produce a presence grid in the format printed by `i2cdetect -y`
    ///
    /// The first row is a column header and the first column of every other
    /// row is a row label; every remaining cell is either `--` or the
    /// two-digit hex address of a responding device.
    fn detect(&mut self) -> Result<String>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl RegisterBus for Box<dyn RegisterBus + Send> {
    fn features(&self) -> BusFeatures {
        (**self).features()
    }

    fn read_block(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>> {
        (**self).read_block(address, register, len)
    }

    fn write_block(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()> {
        (**self).write_block(address, register, data)
    }

    fn detect(&mut self) -> Result<String> {
        (**self).detect()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
