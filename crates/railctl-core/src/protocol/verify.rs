//! Write-verify engine
//!
//! A verified write runs up to [`RetryPolicy::max_attempts`] cycles of:
//!
//! 1. take the next sequence number (wrapping at 256),
//! 2. transmit `[sequence] + data + [checksum]`,
//! 3. read back [`registers::WRITE_SEQUENCE`] and compare it to the number just sent.
//!
//! A failed transmit consumes its sequence number; the next cycle sends a
//! fresh one. A confirmation carrying an older number is therefore a stale
//! or lost write rather than a match.

use super::retry::{Attempt, RetryPolicy};
use super::transport::RegisterTransport;
use crate::bus::{DeviceAddress, RegisterBus};
use crate::error::{Error, Result};
use crate::frame;
use crate::registers;

/// Wrapping write-sequence counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceCounter(u8);

impl SequenceCounter {
    /// Start counting from `value`; the next write uses `value + 1`
    pub const fn starting_at(value: u8) -> Self {
        Self(value)
    }

    /// Last value handed out
    pub const fn current(&self) -> u8 {
        self.0
    }

    /// Advance and return the new value
    pub fn advance(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }
}

/// Outcome of one verified write
///
/// The counters let callers tell transient noise (a few exceptions followed
/// by a confirmation) from a persistent fault.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    /// Transmissions made
    pub attempts: u8,
    /// Transmissions that failed on the bus
    pub write_exceptions: u32,
    /// Confirmation reads that failed on the bus
    pub read_exceptions: u32,
    /// Confirmation reads that returned a bad frame or the wrong sequence
    pub data_mismatches: u32,
    /// Sequence number the device confirmed, if any
    pub confirmed: Option<u8>,
}

impl WriteReport {
    /// Whether the device confirmed the write
    pub fn is_confirmed(&self) -> bool {
        self.confirmed.is_some()
    }

    /// Turn an unconfirmed report into [`Error::Unconfirmed`]
    pub fn into_result(self, address: DeviceAddress, register: u8) -> Result<Self> {
        if self.is_confirmed() {
            Ok(self)
        } else {
            Err(Error::Unconfirmed {
                address,
                register,
                attempts: self.attempts,
            })
        }
    }
}

/// Write-verify engine
///
/// Owns the sequence counter. It must live behind the same serialization
/// point as the bus handle, or confirmation tokens can race.
#[derive(Debug, Clone, Default)]
pub struct WriteVerifier {
    sequence: SequenceCounter,
    policy: RetryPolicy,
}

enum Confirm {
    Matched,
    ReadFailed,
    Mismatch,
}

impl WriteVerifier {
    /// Create an engine with the default attempt budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with an explicit attempt budget
    pub fn with_policy(policy: RetryPolicy) -> Self {
        Self {
            sequence: SequenceCounter::default(),
            policy,
        }
    }

    /// Create an engine whose counter resumes from `sequence`
    pub fn with_sequence(mut self, sequence: SequenceCounter) -> Self {
        self.sequence = sequence;
        self
    }

    /// Last sequence number used
    pub fn sequence(&self) -> u8 {
        self.sequence.current()
    }

    /// Attempt budget
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Write `data` to `register` and confirm it through the sequence register
    ///
    /// Returns `Err` only for requests that can never succeed (payload too
    /// long, unsupported bus). An unconfirmed write is reported through
    /// [`WriteReport::confirmed`] being `None`.
    pub fn write<B: RegisterBus>(
        &mut self,
        transport: &mut RegisterTransport<B>,
        address: DeviceAddress,
        register: u8,
        data: &[u8],
    ) -> Result<WriteReport> {
        if data.len() > frame::MAX_DATA_LEN {
            return Err(Error::PayloadTooLong {
                len: data.len(),
                max: frame::MAX_DATA_LEN,
            });
        }

        let mut report = WriteReport::default();
        let budget = self.policy.max_attempts.max(1);

        for n in 0..budget {
            if n > 0 && self.policy.retry_delay_us > 0 {
                transport.delay_us(self.policy.retry_delay_us);
            }
            report.attempts += 1;

            let sequence = self.sequence.advance();
            let block = frame::encode_write(register, sequence, data)?;

            match transport.transmit(address, register, &block) {
                Ok(()) => {}
                Err(Error::BusIo { source, .. }) => {
                    log::debug!(
                        "write {} to register {} on {} failed: {}",
                        sequence,
                        register,
                        address,
                        source
                    );
                    report.write_exceptions += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            match Self::confirm(transport, address, sequence)? {
                Confirm::Matched => {
                    report.confirmed = Some(sequence);
                    return Ok(report);
                }
                Confirm::ReadFailed => report.read_exceptions += 1,
                Confirm::Mismatch => report.data_mismatches += 1,
            }
        }

        log::warn!(
            "register {} on {}: write not confirmed after {} attempts \
             ({} write exceptions, {} read exceptions, {} mismatches)",
            register,
            address,
            report.attempts,
            report.write_exceptions,
            report.read_exceptions,
            report.data_mismatches
        );
        Ok(report)
    }

    fn confirm<B: RegisterBus>(
        transport: &mut RegisterTransport<B>,
        address: DeviceAddress,
        sequence: u8,
    ) -> Result<Confirm> {
        let attempt = transport.read_attempt(
            address,
            registers::WRITE_SEQUENCE,
            registers::WRITE_SEQUENCE_LEN,
        );
        match attempt {
            Attempt::Done(frame) if frame.first() == Some(sequence) => Ok(Confirm::Matched),
            Attempt::Done(frame) => {
                log::debug!(
                    "{} confirmed sequence {:?}, expected {}",
                    address,
                    frame.first(),
                    sequence
                );
                Ok(Confirm::Mismatch)
            }
            Attempt::Retry(crate::frame::FrameFault::Io) => Ok(Confirm::ReadFailed),
            Attempt::Retry(fault) => {
                log::debug!("{} confirmation frame rejected: {}", address, fault);
                Ok(Confirm::Mismatch)
            }
            Attempt::Fatal(e) => Err(e),
        }
    }
}
