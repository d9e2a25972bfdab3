//! Process-local lock statistics.
//!
//! Observability only, never correctness. The collector is injected at
//! manager construction and resettable, so tests can assert on counts
//! independently per run.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Number of completed holds the rolling hold-time average covers.
pub const HOLD_TIME_WINDOW: usize = 100;

/// Snapshot of the collector's current counters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LockStats {
    /// Successful acquisitions.
    pub acquired: u64,
    /// Acquisitions that exhausted all attempts.
    pub failed: u64,
    /// Successful releases.
    pub released: u64,
    /// Mean hold time over the most recent completed holds.
    pub avg_hold_time: Duration,
}

/// Resettable counters shared by all lock managers that receive it.
#[derive(Debug, Default)]
pub struct LockStatsCollector {
    acquired: AtomicU64,
    failed: AtomicU64,
    released: AtomicU64,
    hold_times: Mutex<VecDeque<Duration>>,
}

impl LockStatsCollector {
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful acquisition.
    pub fn record_acquired(&self) {
        self.acquired.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an acquisition that exhausted its attempts.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a successful release and the duration the lock was held.
    pub fn record_released(&self, held_for: Duration) {
        self.released.fetch_add(1, Ordering::Relaxed);
        let mut hold_times = self.hold_times.lock().expect("stats mutex poisoned");
        if hold_times.len() == HOLD_TIME_WINDOW {
            hold_times.pop_front();
        }
        hold_times.push_back(held_for);
    }

    /// Returns the current counter values.
    pub fn snapshot(&self) -> LockStats {
        let hold_times = self.hold_times.lock().expect("stats mutex poisoned");
        let avg_hold_time = if hold_times.is_empty() {
            Duration::ZERO
        } else {
            hold_times.iter().sum::<Duration>() / hold_times.len() as u32
        };
        LockStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            avg_hold_time,
        }
    }

    /// Resets every counter to zero.
    pub fn reset(&self) {
        self.acquired.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.released.store(0, Ordering::Relaxed);
        self.hold_times
            .lock()
            .expect("stats mutex poisoned")
            .clear();
    }
}
