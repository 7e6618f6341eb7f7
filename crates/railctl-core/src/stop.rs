//! Cooperative stop signal for long-running loops

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag checked once per iteration by diagnostics and pollers
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Create a signal that has not been raised
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder to stop after its current iteration
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
