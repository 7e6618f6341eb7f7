//! Stress test loops

use super::tally::{LoopbackTally, ReadTally, TestTally};
use crate::access::RegisterAccess;
use crate::bus::DeviceAddress;
use crate::error::{Error, Result};
use crate::frame::FrameFault;
use crate::protocol::Attempt;
use crate::registers;
use crate::stop::StopSignal;

/// Pause between iterations so the board's receive buffer can drain
pub const DEFAULT_PAUSE_US: u32 = 1_000;

/// Probes sent by a default loopback run
pub const LOOPBACK_MESSAGES: u32 = 256;

/// Pacing and cancellation for a run
#[derive(Debug, Clone)]
pub struct RunControl {
    /// Pause between iterations, in microseconds
    pub pause_us: u32,
    /// Checked before every iteration
    pub stop: StopSignal,
}

impl Default for RunControl {
    fn default() -> Self {
        Self {
            pause_us: DEFAULT_PAUSE_US,
            stop: StopSignal::new(),
        }
    }
}

impl RunControl {
    /// Default pacing with an external stop signal
    pub fn with_stop(stop: StopSignal) -> Self {
        Self {
            stop,
            ..Default::default()
        }
    }

    /// Run `body` up to `iterations` times, pausing in between
    ///
    /// `progress` receives the number of completed iterations.
    fn drive<A, F, P>(&self, access: &mut A, iterations: u32, mut progress: P, mut body: F) -> Result<()>
    where
        A: RegisterAccess + ?Sized,
        F: FnMut(&mut A, u32) -> Result<()>,
        P: FnMut(u32),
    {
        for i in 0..iterations {
            if self.stop.is_stopped() {
                log::info!("diag: stopped after {} of {} iterations", i, iterations);
                break;
            }
            if i > 0 && self.pause_us > 0 {
                access.pause_us(self.pause_us);
            }
            body(access, i)?;
            progress(i + 1);
        }
        Ok(())
    }
}

/// Repeat a framed block read and classify each outcome
///
/// Each iteration is a single attempt so every fault is seen. Reads
/// [`registers::DIAG_BLOCK_LEN`] data bytes. A wrong echoed register id is
/// counted as an echo mismatch even when the session ignores echoes.
pub fn block_read_test<A, P>(
    access: &mut A,
    address: DeviceAddress,
    register: u8,
    iterations: u32,
    control: &RunControl,
    progress: P,
) -> Result<ReadTally>
where
    A: RegisterAccess + ?Sized,
    P: FnMut(u32),
{
    let mut tally = ReadTally::default();
    control.drive(access, iterations, progress, |access, _| {
        match access.read_attempt(address, register, registers::DIAG_BLOCK_LEN) {
            Attempt::Done(frame) if frame.register != register => tally.record(Some(FrameFault::Echo {
                expected: register,
                actual: frame.register,
            })),
            Attempt::Done(_) => tally.record(None),
            Attempt::Retry(fault) => tally.record(Some(fault)),
            Attempt::Fatal(e) => return Err(e),
        }
        Ok(())
    })?;
    Ok(tally)
}

/// Repeat a write-verify cycle with incrementing payloads
///
/// Iteration `i` writes bytes `i, i+1, ...` (mod 256), so consecutive
/// writes never carry the same data.
pub fn block_write_test<A, P>(
    access: &mut A,
    address: DeviceAddress,
    register: u8,
    iterations: u32,
    control: &RunControl,
    progress: P,
) -> Result<TestTally>
where
    A: RegisterAccess + ?Sized,
    P: FnMut(u32),
{
    let mut tally = TestTally::default();
    control.drive(access, iterations, progress, |access, i| {
        let payload: Vec<u8> = (0..registers::DIAG_BLOCK_LEN as u32)
            .map(|n| (i.wrapping_add(n) & 0xFF) as u8)
            .collect();
        let report = access.write_register_verify(address, register, &payload)?;
        tally.record(&report);
        Ok(())
    })?;
    Ok(tally)
}

/// Read the loopback register raw, counting bus errors only
pub fn loopback_test<A, P>(
    access: &mut A,
    address: DeviceAddress,
    iterations: u32,
    control: &RunControl,
    progress: P,
) -> Result<LoopbackTally>
where
    A: RegisterAccess + ?Sized,
    P: FnMut(u32),
{
    let mut tally = LoopbackTally::default();
    control.drive(access, iterations, progress, |access, _| {
        tally.sent += 1;
        match access.read_raw(address, registers::LOOPBACK, registers::LOOPBACK_LEN) {
            Ok(_) => Ok(()),
            Err(Error::BusIo { source, .. }) => {
                log::debug!("loopback: {} failed: {}", address, source);
                tally.errors += 1;
                Ok(())
            }
            Err(e) => Err(e),
        }
    })?;
    Ok(tally)
}
