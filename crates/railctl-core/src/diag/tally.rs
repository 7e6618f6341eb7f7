//! Diagnostic counters

use crate::frame::FrameFault;
use crate::protocol::WriteReport;
use core::fmt;

/// Outcome counts of a block read run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadTally {
    /// Reads attempted
    pub attempted: u32,
    /// Reads that returned a valid frame
    pub clean: u32,
    /// Wrong number of bytes
    pub length_mismatches: u32,
    /// Bad checksum
    pub checksum_mismatches: u32,
    /// Echoed register id differs from the one requested
    pub echo_mismatches: u32,
    /// Bus transfer failed
    pub io_errors: u32,
}

impl ReadTally {
    /// Count one classified attempt
    pub fn record(&mut self, outcome: Option<FrameFault>) {
        self.attempted += 1;
        match outcome {
            None => self.clean += 1,
            Some(FrameFault::Length { .. }) => self.length_mismatches += 1,
            Some(FrameFault::Checksum) => self.checksum_mismatches += 1,
            Some(FrameFault::Echo { .. }) => self.echo_mismatches += 1,
            Some(FrameFault::Io) => self.io_errors += 1,
        }
    }

    /// Attempts that did not return a valid frame
    pub fn failures(&self) -> u32 {
        self.attempted - self.clean
    }
}

impl fmt::Display for ReadTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reads: {} clean, {} length, {} checksum, {} echo, {} I/O",
            self.attempted,
            self.clean,
            self.length_mismatches,
            self.checksum_mismatches,
            self.echo_mismatches,
            self.io_errors
        )
    }
}

/// Aggregate counts of a write-verify run
///
/// Reset only by starting a new run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestTally {
    /// Frames transmitted, retries included
    pub messages: u32,
    /// Confirmation reads that failed on the bus
    pub read_exceptions: u32,
    /// Transmissions that failed on the bus
    pub write_exceptions: u32,
    /// Confirmations with a bad frame or the wrong sequence
    pub data_mismatches: u32,
    /// Writes never confirmed within the attempt budget
    pub uncorrectable: u32,
}

impl TestTally {
    /// Fold one write-verify report into the tally
    pub fn record(&mut self, report: &WriteReport) {
        self.messages += u32::from(report.attempts);
        self.read_exceptions += report.read_exceptions;
        self.write_exceptions += report.write_exceptions;
        self.data_mismatches += report.data_mismatches;
        if !report.is_confirmed() {
            self.uncorrectable += 1;
        }
    }
}

impl fmt::Display for TestTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages: {} read exceptions, {} write exceptions, {} data mismatches, {} uncorrectable",
            self.messages,
            self.read_exceptions,
            self.write_exceptions,
            self.data_mismatches,
            self.uncorrectable
        )
    }
}

/// Counts of a loopback run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopbackTally {
    /// Probes sent
    pub sent: u32,
    /// Probes that failed on the bus
    pub errors: u32,
}

impl fmt::Display for LoopbackTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sent, {} errors", self.sent, self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_tally_counts_uncorrectable() {
        let mut tally = TestTally::default();
        tally.record(&WriteReport {
            attempts: 2,
            write_exceptions: 1,
            confirmed: Some(7),
            ..Default::default()
        });
        tally.record(&WriteReport {
            attempts: 4,
            data_mismatches: 4,
            ..Default::default()
        });
        assert_eq!(
            tally,
            TestTally {
                messages: 6,
                read_exceptions: 0,
                write_exceptions: 1,
                data_mismatches: 4,
                uncorrectable: 1,
            }
        );
    }

    #[test]
    fn test_read_tally_classes() {
        let mut tally = ReadTally::default();
        tally.record(None);
        tally.record(Some(FrameFault::Checksum));
        tally.record(Some(FrameFault::Echo {
            expected: 100,
            actual: 99,
        }));
        assert_eq!(tally.attempted, 3);
        assert_eq!(tally.failures(), 2);
        assert_eq!(tally.echo_mismatches, 1);
    }
}
