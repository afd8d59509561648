//! Hit counters shared by the `/attack` handler and the periodic tasks.
//!
//! Every mutation goes through one short `Mutex` critical section. Nothing is
//! awaited and no I/O happens while it is held, so the hit path never waits
//! on the sampler's disk writes.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    /// Hits since the last daily reset.
    pub cumulative: u64,
    /// Hits since the last sample tick.
    pub interval: u64,
}

#[derive(Debug, Default)]
pub struct CounterState {
    counts: Mutex<Counts>,
}

impl CounterState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Counts> {
        // Counts stay consistent even if a holder panicked; every critical
        // section is a couple of integer stores.
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one hit in both buckets.
    pub fn record_hit(&self) {
        let mut c = self.lock();
        c.cumulative = c.cumulative.saturating_add(1);
        c.interval = c.interval.saturating_add(1);
    }

    /// Read and zero the interval bucket in one step.
    ///
    /// The returned `cumulative` is read under the same lock, so the pair is
    /// coherent. A hit racing with this call lands in the next interval.
    pub fn take_interval(&self) -> Counts {
        let mut c = self.lock();
        let snapshot = *c;
        c.interval = 0;
        snapshot
    }

    /// Zero the daily total. The interval bucket is left alone.
    pub fn reset_cumulative(&self) {
        self.lock().cumulative = 0;
    }

    pub fn snapshot(&self) -> Counts {
        *self.lock()
    }
}
