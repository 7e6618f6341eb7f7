//! Register transport
//!
//! One logical register read or write against one device, hiding bus-level
//! retries and framing errors from the caller.

use super::retry::{Attempt, RetryOutcome, RetryPolicy};
use crate::bus::{BusFeatures, DeviceAddress, RegisterBus};
use crate::error::{Error, Result};
use crate::frame::{self, EchoCheck, RegisterFrame, MAX_DATA_LEN};

/// Read policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadPolicy {
    /// Attempt budget for reads
    pub retry: RetryPolicy,
    /// Whether the echoed register id must match
    pub echo: EchoCheck,
}

impl ReadPolicy {
    /// Default policy with the echo check relaxed
    pub fn lenient() -> Self {
        Self {
            echo: EchoCheck::Ignore,
            ..Default::default()
        }
    }
}

/// Register transport over a [`RegisterBus`]
pub struct RegisterTransport<B> {
    bus: B,
    policy: ReadPolicy,
}

impl<B: RegisterBus> RegisterTransport<B> {
    /// Create a transport with the default read policy
    pub fn new(bus: B) -> Self {
        Self::with_policy(bus, ReadPolicy::default())
    }

    /// Create a transport with an explicit read policy
    pub fn with_policy(bus: B, policy: ReadPolicy) -> Self {
        Self { bus, policy }
    }

    /// Current read policy
    pub fn policy(&self) -> ReadPolicy {
        self.policy
    }

    /// Replace the read policy
    pub fn set_policy(&mut self, policy: ReadPolicy) {
        self.policy = policy;
    }

    /// Access the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutable access to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the transport and return the bus
    pub fn into_inner(self) -> B {
        self.bus
    }

    fn require(&self, feature: BusFeatures, what: &'static str) -> Result<()> {
        if self.bus.features().contains(feature) {
            Ok(())
        } else {
            Err(Error::Unsupported(what))
        }
    }

    /// Make exactly one read attempt, classifying the outcome
    ///
    /// Diagnostics use this directly to count fault classes; normal reads go
    /// through [`Self::read_register`].
    pub fn read_attempt(
        &mut self,
        address: DeviceAddress,
        register: u8,
        data_len: usize,
    ) -> Attempt<RegisterFrame> {
        if data_len > MAX_DATA_LEN {
            return Attempt::Fatal(Error::PayloadTooLong {
                len: data_len,
                max: MAX_DATA_LEN,
            });
        }
        if let Err(e) = self.require(BusFeatures::BLOCK_READ, "block read") {
            return Attempt::Fatal(e);
        }

        let echo = self.policy.echo;
        let result = self
            .bus
            .read_block(address, register, frame::read_frame_len(data_len));
        Attempt::from_bus(result, |bytes| {
            match RegisterFrame::decode(register, data_len, &bytes, echo) {
                Ok(frame) => Attempt::Done(frame),
                Err(fault) => Attempt::Retry(fault),
            }
        })
    }

    /// Read `data_len` data bytes from `register`, retrying transient faults
    ///
    /// On success the frame holds the echoed register id and the data with
    /// id and checksum stripped. When the budget is exhausted the call fails
    /// with [`Error::RetriesExhausted`]; callers decide whether that leaves a
    /// field at its default or is reported.
    pub fn read_register(
        &mut self,
        address: DeviceAddress,
        register: u8,
        data_len: usize,
    ) -> Result<RegisterFrame> {
        let retry = self.policy.retry;
        let outcome = retry.run(|n| {
            if n > 0 && retry.retry_delay_us > 0 {
                self.bus.delay_us(retry.retry_delay_us);
            }
            self.read_attempt(address, register, data_len)
        });

        match outcome {
            RetryOutcome::Success { value, attempts } => {
                if attempts > 1 {
                    log::debug!(
                        "register {} on {} read after {} attempts",
                        register,
                        address,
                        attempts
                    );
                }
                Ok(value)
            }
            RetryOutcome::Exhausted { attempts, last } => {
                log::warn!(
                    "register {} on {}: giving up after {} attempts ({})",
                    register,
                    address,
                    attempts,
                    last
                );
                Err(Error::RetriesExhausted {
                    address,
                    register,
                    attempts,
                    last,
                })
            }
            RetryOutcome::Aborted(e) => Err(e),
        }
    }

    /// Read `len` raw bytes from `register` without any framing checks
    pub fn read_raw(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>> {
        self.require(BusFeatures::BLOCK_READ, "block read")?;
        self.bus.read_block(address, register, len)
    }

    /// Write `data` to `register` with a trailing checksum, once, unverified
    pub fn write_register(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()> {
        let block = frame::encode_raw(register, data)?;
        self.transmit(address, register, &block)
    }

    /// Send an already framed block to `register`
    pub fn transmit(&mut self, address: DeviceAddress, register: u8, block: &[u8]) -> Result<()> {
        self.require(BusFeatures::BLOCK_WRITE, "block write")?;
        self.bus.write_block(address, register, block)
    }

    /// Pause the bus for `us` microseconds
    pub fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::frame::{encode_read_response, FrameFault};
    use std::collections::VecDeque;

    /// One scripted bus reply
    pub(crate) enum Reply {
        Bytes(Vec<u8>),
        Io,
    }

    /// Bus that plays back scripted replies and records every transfer
    #[derive(Default)]
    pub(crate) struct ScriptedBus {
        pub reads: VecDeque<Reply>,
        pub writes: VecDeque<bool>,
        pub read_log: Vec<(u8, u8, usize)>,
        pub write_log: Vec<(u8, u8, Vec<u8>)>,
        pub grid: Option<String>,
        pub delays: Vec<u32>,
    }

    impl ScriptedBus {
        pub fn reply(mut self, reply: Reply) -> Self {
            self.reads.push_back(reply);
            self
        }

        pub fn frame(self, register: u8, data: &[u8]) -> Self {
            self.reply(Reply::Bytes(encode_read_response(register, data)))
        }
    }

    fn io_error(address: DeviceAddress) -> Error {
        Error::BusIo {
            address,
            source: std::io::Error::new(std::io::ErrorKind::Other, "no ack"),
        }
    }

    impl RegisterBus for ScriptedBus {
        fn features(&self) -> BusFeatures {
            BusFeatures::FULL
        }

        fn read_block(&mut self, address: DeviceAddress, register: u8, len: usize) -> Result<Vec<u8>> {
            self.read_log.push((address.get(), register, len));
            match self.reads.pop_front() {
                Some(Reply::Bytes(bytes)) => Ok(bytes),
                Some(Reply::Io) | None => Err(io_error(address)),
            }
        }

        fn write_block(&mut self, address: DeviceAddress, register: u8, data: &[u8]) -> Result<()> {
            self.write_log.push((address.get(), register, data.to_vec()));
            if self.writes.pop_front().unwrap_or(true) {
                Ok(())
            } else {
                Err(io_error(address))
            }
        }

        fn detect(&mut self) -> Result<String> {
            self.grid
                .clone()
                .ok_or_else(|| Error::ProbeFailed("i2cdetect: command not found".into()))
        }

        fn delay_us(&mut self, us: u32) {
            self.delays.push(us);
        }
    }

    pub(crate) fn addr(raw: u8) -> DeviceAddress {
        DeviceAddress::new(raw).unwrap()
    }

    #[test]
    fn test_read_succeeds_on_fourth_attempt() {
        let bus = ScriptedBus::default()
            .reply(Reply::Io)
            .reply(Reply::Io)
            .reply(Reply::Io)
            .frame(3, b"Lights");
        let mut transport = RegisterTransport::new(bus);

        let frame = transport.read_register(addr(0x09), 3, 6).unwrap();
        assert_eq!(frame.register, 3);
        assert_eq!(&frame.payload[..], b"Lights");
        assert_eq!(transport.bus().read_log.len(), 4);
        // id + data + checksum
        assert_eq!(transport.bus().read_log[0], (0x09, 3, 8));
    }

    #[test]
    fn test_read_fails_after_four_io_errors() {
        let bus = ScriptedBus::default()
            .reply(Reply::Io)
            .reply(Reply::Io)
            .reply(Reply::Io)
            .reply(Reply::Io)
            .frame(3, b"never read");
        let mut transport = RegisterTransport::new(bus);

        let err = transport.read_register(addr(0x09), 3, 10).unwrap_err();
        assert!(matches!(
            err,
            Error::RetriesExhausted {
                attempts: 4,
                last: FrameFault::Io,
                ..
            }
        ));
        assert_eq!(transport.bus().read_log.len(), 4);
    }

    #[test]
    fn test_wrong_length_exhausts_budget() {
        let mut bus = ScriptedBus::default();
        for _ in 0..6 {
            bus = bus.frame(0, &[1, 1]);
        }
        let mut transport = RegisterTransport::new(bus);

        let err = transport.read_register(addr(0x08), 0, 1).unwrap_err();
        assert!(matches!(
            err,
            Error::RetriesExhausted {
                register: 0,
                attempts: 4,
                last: FrameFault::Length {
                    expected: 3,
                    actual: 4
                },
                ..
            }
        ));
        assert_eq!(transport.bus().read_log.len(), 4);
        assert_eq!(transport.bus().reads.len(), 2);
    }

    #[test]
    fn test_echo_mismatch_is_retried_unless_ignored() {
        let bus = ScriptedBus::default().frame(7, &[1]).frame(2, &[5]);
        let mut transport = RegisterTransport::new(bus);
        let frame = transport.read_register(addr(0x08), 2, 1).unwrap();
        assert_eq!(frame.first(), Some(5));
        assert_eq!(transport.bus().read_log.len(), 2);

        let bus = ScriptedBus::default().frame(7, &[1]);
        let mut transport = RegisterTransport::with_policy(bus, ReadPolicy::lenient());
        let frame = transport.read_register(addr(0x08), 2, 1).unwrap();
        assert_eq!(frame.register, 7);
        assert_eq!(transport.bus().read_log.len(), 1);
    }

    #[test]
    fn test_retry_delay_between_attempts() {
        let bus = ScriptedBus::default().reply(Reply::Io).frame(0, &[1]);
        let policy = ReadPolicy {
            retry: RetryPolicy::default().with_delay_us(500),
            ..Default::default()
        };
        let mut transport = RegisterTransport::with_policy(bus, policy);
        transport.read_register(addr(0x08), 0, 1).unwrap();
        assert_eq!(transport.bus().delays, vec![500]);
    }

    #[test]
    fn test_oversized_read_is_fatal() {
        let mut transport = RegisterTransport::new(ScriptedBus::default());
        let err = transport.read_register(addr(0x08), 0, 31).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLong { len: 31, .. }));
        assert!(transport.bus().read_log.is_empty());
    }

    #[test]
    fn test_raw_write_appends_checksum() {
        let mut transport = RegisterTransport::new(ScriptedBus::default());
        transport.write_register(addr(0x09), 30, &[4, 100]).unwrap();

        let (adr, reg, data) = &transport.bus().write_log[0];
        assert_eq!((*adr, *reg), (0x09, 30));
        assert_eq!(data.len(), 3);
        assert!(frame::validate_write(30, data));
    }

    #[test]
    fn test_raw_write_not_retried() {
        let mut bus = ScriptedBus::default();
        bus.writes.push_back(false);
        let mut transport = RegisterTransport::new(bus);
        assert!(matches!(
            transport.write_register(addr(0x09), 30, &[1, 2]),
            Err(Error::BusIo { .. })
        ));
        assert_eq!(transport.bus().write_log.len(), 1);
    }
}
