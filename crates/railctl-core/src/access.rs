//! Register access seam
//!
//! Inventory, diagnostics and the board helpers are written against
//! [`RegisterAccess`] so they run the same way on an exclusively owned
//! [`crate::session::BusSession`] and on a lock-guarded shared session.

use crate::bus::DeviceAddress;
use crate::error::Result;
use crate::frame::RegisterFrame;
use crate::protocol::{Attempt, WriteReport};
use crate::scan::Enumeration;

/// Register-level operations on a serialized bus
///
/// Every call is one complete transaction (or retry loop, or write-verify
/// cycle); implementations must not interleave two calls on the wire.
pub trait RegisterAccess {
    /// Read `len` data bytes from `register`, retrying transient faults
    fn read_register(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<RegisterFrame>;

    /// Make a single classified read attempt
    fn read_attempt(&mut self, address: DeviceAddress, register: u8, len: usize) -> Attempt<RegisterFrame>;

    /// Read raw bytes with no framing checks
    fn read_raw(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>>;

    /// Single-shot checksummed write, no confirmation
    fn write_register(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()>;

    /// Sequence-numbered write confirmed by read-back
    fn write_register_verify(
        &mut self,
        address: DeviceAddress,
        register: u8,
        data: &[u8],
    ) -> Result<WriteReport>;

    /// Pause between transactions
    fn pause_us(&mut self, us: u32);

    /// Run the bus probe and list responding addresses
    fn enumerate(&mut self) -> Enumeration;
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read_register(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<RegisterFrame> {
        (**self).read_register(address, register, len)
    }

    fn read_attempt(&mut self, address: DeviceAddress, register: u8, len: usize) -> Attempt<RegisterFrame> {
        (**self).read_attempt(address, register, len)
    }

    fn read_raw(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>> {
        (**self).read_raw(address, register, len)
    }

    fn write_register(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()> {
        (**self).write_register(address, register, data)
    }

    fn write_register_verify(
        &mut self,
        address: DeviceAddress,
        register: u8,
        data: &[u8],
    ) -> Result<WriteReport> {
        (**self).write_register_verify(address, register, data)
    }

    fn pause_us(&mut self, us: u32) {
        (**self).pause_us(us)
    }

    fn enumerate(&mut self) -> Enumeration {
        (**self).enumerate()
    }
}
