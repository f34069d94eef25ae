//! Delivery counters for progress reporting and the exit summary

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one forwarder run
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Messages handed to a broker (replayed and live)
    published: AtomicU64,
    /// Of those, messages that came from the spool
    replayed: AtomicU64,
    /// Single-broker publish failures
    failed_attempts: AtomicU64,
    /// Cycles in which every broker failed
    retry_cycles: AtomicU64,
    /// Messages written to the spool
    spooled: AtomicU64,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    pub fn inc_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn replayed(&self) -> u64 {
        self.replayed.load(Ordering::Relaxed)
    }

    pub fn inc_replayed(&self) {
        self.replayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn failed_attempts(&self) -> u64 {
        self.failed_attempts.load(Ordering::Relaxed)
    }

    pub fn inc_failed_attempts(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn retry_cycles(&self) -> u64 {
        self.retry_cycles.load(Ordering::Relaxed)
    }

    pub fn inc_retry_cycles(&self) {
        self.retry_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn spooled(&self) -> u64 {
        self.spooled.load(Ordering::Relaxed)
    }

    pub fn add_spooled(&self, count: u64) {
        self.spooled.fetch_add(count, Ordering::Relaxed);
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            published: self.published(),
            replayed: self.replayed(),
            failed_attempts: self.failed_attempts(),
            retry_cycles: self.retry_cycles(),
            spooled: self.spooled(),
        }
    }
}

/// Point-in-time copy of [`DispatchMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub published: u64,
    pub replayed: u64,
    pub failed_attempts: u64,
    pub retry_cycles: u64,
    pub spooled: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot() {
        let metrics = DispatchMetrics::new();
        metrics.inc_published();
        metrics.inc_published();
        metrics.inc_replayed();
        metrics.inc_failed_attempts();
        metrics.inc_retry_cycles();
        metrics.add_spooled(3);

        let snap = metrics.snapshot();
        assert_eq!(
            snap,
            MetricsSnapshot {
                published: 2,
                replayed: 1,
                failed_attempts: 1,
                retry_cycles: 1,
                spooled: 3,
            }
        );
    }
}
