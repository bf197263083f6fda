//! Settle delay
//!
//! The driver exposes no completion event for policy writes; the active-card
//! readback is stale until the delay has elapsed.

use std::time::Duration;

/// Blocks the caller for the settle delay
pub trait Settle {
    /// Wait for `delay`
    fn settle(&mut self, delay: Duration);
}

/// Settles by sleeping the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Settle for ThreadSleep {
    fn settle(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl<F: FnMut(Duration)> Settle for F {
    fn settle(&mut self, delay: Duration) {
        self(delay)
    }
}
