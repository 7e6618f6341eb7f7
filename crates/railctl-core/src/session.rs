//! Bus session
//!
//! A [`BusSession`] owns the bus handle together with the write-sequence
//! counter, so the two can only ever be used under the same borrow. Share a
//! session between threads by putting the whole thing behind one lock.

use crate::access::RegisterAccess;
use crate::bus::{DeviceAddress, RegisterBus};
use crate::error::Result;
use crate::frame::RegisterFrame;
use crate::protocol::{Attempt, ReadPolicy, RegisterTransport, RetryPolicy, WriteReport, WriteVerifier};
use crate::scan::{self, Enumeration};

/// Exclusive owner of one bus
pub struct BusSession<B> {
    transport: RegisterTransport<B>,
    verifier: WriteVerifier,
}

impl<B: RegisterBus> BusSession<B> {
    /// Open a session with the default policies
    pub fn new(bus: B) -> Self {
        Self::with_policy(bus, ReadPolicy::default())
    }

    /// Open a session with an explicit read policy
    ///
    /// Verified writes use the same attempt budget and delay as reads.
    pub fn with_policy(bus: B, policy: ReadPolicy) -> Self {
        Self {
            transport: RegisterTransport::with_policy(bus, policy),
            verifier: WriteVerifier::with_policy(policy.retry),
        }
    }

    /// Override the write attempt budget
    pub fn with_write_policy(mut self, policy: RetryPolicy) -> Self {
        self.verifier = WriteVerifier::with_policy(policy);
        self
    }

    /// Last write sequence number used
    pub fn sequence(&self) -> u8 {
        self.verifier.sequence()
    }

    /// Access the transport
    pub fn transport(&self) -> &RegisterTransport<B> {
        &self.transport
    }

    /// Mutable access to the transport
    pub fn transport_mut(&mut self) -> &mut RegisterTransport<B> {
        &mut self.transport
    }

    /// Close the session and return the bus
    pub fn into_inner(self) -> B {
        self.transport.into_inner()
    }
}

impl<B: RegisterBus> RegisterAccess for BusSession<B> {
    fn read_register(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<RegisterFrame> {
        self.transport.read_register(address, register, len)
    }

    fn read_attempt(&mut self, address: DeviceAddress, register: u8, len: usize) -> Attempt<RegisterFrame> {
        self.transport.read_attempt(address, register, len)
    }

    fn read_raw(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>> {
        self.transport.read_raw(address, register, len)
    }

    fn write_register(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()> {
        self.transport.write_register(address, register, data)
    }

    fn write_register_verify(
        &mut self,
        address: DeviceAddress,
        register: u8,
        data: &[u8],
    ) -> Result<WriteReport> {
        self.verifier.write(&mut self.transport, address, register, data)
    }

    fn pause_us(&mut self, us: u32) {
        self.transport.delay_us(us);
    }

    fn enumerate(&mut self) -> Enumeration {
        scan::enumerate(self.transport.bus_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::tests::{addr, ScriptedBus};
    use crate::registers;

    #[test]
    fn test_sequence_persists_across_writes() {
        let bus = ScriptedBus::default()
            .frame(registers::WRITE_SEQUENCE, &[1])
            .frame(registers::WRITE_SEQUENCE, &[2]);
        let mut session = BusSession::new(bus);

        session.write_register_verify(addr(0x0a), 50, &[1, 1]).unwrap();
        session.write_register_verify(addr(0x0a), 50, &[1, 0]).unwrap();
        assert_eq!(session.sequence(), 2);
    }

    #[test]
    fn test_read_policy_shared_with_writes() {
        let policy = ReadPolicy {
            retry: RetryPolicy::new(2),
            ..Default::default()
        };
        let mut session = BusSession::with_policy(ScriptedBus::default(), policy);
        let report = session.write_register_verify(addr(0x08), 40, &[0, 0]).unwrap();
        assert_eq!(report.attempts, 2);
        assert_eq!(report.read_exceptions, 2);
    }
}
