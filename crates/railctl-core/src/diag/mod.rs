//! Diagnostic test runners
//!
//! Repeat a register transaction many times and count what went wrong.
//! Runners return tallies and never act on them; they change no device
//! state except the scratch register the write test targets.

mod runners;
mod tally;

pub use runners::{block_read_test, block_write_test, loopback_test, RunControl, DEFAULT_PAUSE_US, LOOPBACK_MESSAGES};
pub use tally::{LoopbackTally, ReadTally, TestTally};
