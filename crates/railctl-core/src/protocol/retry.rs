//! Bounded retry loop
//!
//! Every protocol operation that may be retried runs as a sequence of
//! attempts, each producing an [`Attempt`]. The loop stops on the first
//! success or terminal error, or when the budget runs out.

use crate::error::Error;
use crate::frame::FrameFault;

/// Attempt budget used by the board protocol
pub const DEFAULT_ATTEMPTS: u8 = 4;

/// Result of one attempt
#[derive(Debug)]
pub enum Attempt<T> {
    /// The attempt succeeded
    Done(T),
    /// Transient fault, another attempt may succeed
    Retry(FrameFault),
    /// Terminal error, retrying cannot help
    Fatal(Error),
}

impl<T> Attempt<T> {
    /// Classify a bus result: I/O errors are retryable, anything else is terminal
    pub fn from_bus<U>(result: crate::error::Result<U>, f: impl FnOnce(U) -> Attempt<T>) -> Self {
        match result {
            Ok(value) => f(value),
            Err(Error::BusIo { address, source }) => {
                log::debug!("bus I/O error at {}: {}", address, source);
                Attempt::Retry(FrameFault::Io)
            }
            Err(e) => Attempt::Fatal(e),
        }
    }
}

/// Result of a whole retry loop
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// An attempt succeeded
    Success {
        /// Value produced by the successful attempt
        value: T,
        /// Attempts used, including the successful one
        attempts: u8,
    },
    /// Every attempt failed with a transient fault
    Exhausted {
        /// Attempts made
        attempts: u8,
        /// Fault seen on the final attempt
        last: FrameFault,
    },
    /// An attempt failed with a terminal error
    Aborted(Error),
}

/// Retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least one is always made)
    pub max_attempts: u8,
    /// Pause before each retry, in microseconds
    pub retry_delay_us: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
            retry_delay_us: 0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and no delay
    pub fn new(max_attempts: u8) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the pause before each retry
    pub fn with_delay_us(mut self, retry_delay_us: u32) -> Self {
        self.retry_delay_us = retry_delay_us;
        self
    }

    /// Run `attempt` until it succeeds, fails terminally, or the budget is spent
    ///
    /// The closure receives the zero-based attempt index.
    pub fn run<T, F>(&self, mut attempt: F) -> RetryOutcome<T>
    where
        F: FnMut(u8) -> Attempt<T>,
    {
        let budget = self.max_attempts.max(1);
        let mut last = FrameFault::Io;

        for n in 0..budget {
            match attempt(n) {
                Attempt::Done(value) => {
                    return RetryOutcome::Success {
                        value,
                        attempts: n + 1,
                    }
                }
                Attempt::Retry(fault) => {
                    log::debug!("attempt {}/{} failed: {}", n + 1, budget, fault);
                    last = fault;
                }
                Attempt::Fatal(e) => return RetryOutcome::Aborted(e),
            }
        }

        RetryOutcome::Exhausted {
            attempts: budget,
            last,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeds_on_last_attempt() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let outcome = policy.run(|n| {
            calls += 1;
            if n < 3 {
                Attempt::Retry(FrameFault::Io)
            } else {
                Attempt::Done(n)
            }
        });
        assert!(matches!(outcome, RetryOutcome::Success { value: 3, attempts: 4 }));
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_exhausts_budget() {
        let policy = RetryPolicy::new(4);
        let mut calls = 0;
        let outcome: RetryOutcome<()> = policy.run(|_| {
            calls += 1;
            Attempt::Retry(FrameFault::Checksum)
        });
        assert!(matches!(
            outcome,
            RetryOutcome::Exhausted {
                attempts: 4,
                last: FrameFault::Checksum
            }
        ));
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_fatal_stops_immediately() {
        let policy = RetryPolicy::default();
        let mut calls = 0;
        let outcome: RetryOutcome<()> = policy.run(|_| {
            calls += 1;
            Attempt::Fatal(Error::Unsupported("block read"))
        });
        assert!(matches!(outcome, RetryOutcome::Aborted(Error::Unsupported(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_zero_budget_still_tries_once() {
        let outcome = RetryPolicy::new(0).run(|_| Attempt::Done(()));
        assert!(matches!(outcome, RetryOutcome::Success { attempts: 1, .. }));
    }
}
