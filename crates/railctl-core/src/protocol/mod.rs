//! Register protocol
//!
//! - [`retry`] - bounded attempt loop with tagged per-attempt results
//! - [`transport`] - framed, checksummed register reads with retry, and raw writes
//! - [`verify`] - sequence-numbered writes confirmed by read-back

pub mod retry;
pub mod transport;
pub mod verify;

pub use retry::{Attempt, RetryOutcome, RetryPolicy, DEFAULT_ATTEMPTS};
pub use transport::{ReadPolicy, RegisterTransport};
pub use verify::{SequenceCounter, WriteReport, WriteVerifier};
