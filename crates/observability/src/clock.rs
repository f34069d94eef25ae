//! Wall-clock abstraction for the monitor gate and log timestamps.
//!
//! Production code uses `SystemClock`; tests inject `ManualClock` to step
//! through sampling periods deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

/// `asctime`-style layout, e.g. `Sun Oct 18 09:05:00 2026`
pub const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Source of wall-clock time
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Seconds since the Unix epoch
    fn now_secs(&self) -> u64;

    /// Human-readable timestamp of the current instant
    fn timestamp(&self) -> String;
}

/// Real clock, local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> u64 {
        Utc::now().timestamp().max(0) as u64
    }

    fn timestamp(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Manually stepped clock (UTC timestamps)
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    secs: Arc<AtomicU64>,
}

impl ManualClock {
    /// Clock frozen at `secs`
    pub fn at(secs: u64) -> Self {
        Self {
            secs: Arc::new(AtomicU64::new(secs)),
        }
    }

    /// Jump to `secs`
    pub fn set(&self, secs: u64) {
        self.secs.store(secs, Ordering::SeqCst);
    }

    /// Move forward by `secs`
    pub fn advance(&self, secs: u64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> u64 {
        self.secs.load(Ordering::SeqCst)
    }

    fn timestamp(&self) -> String {
        DateTime::<Utc>::from_timestamp(self.now_secs() as i64, 0)
            .unwrap_or_default()
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_timestamp_layout() {
        let clock = ManualClock::at(0);
        assert_eq!(clock.timestamp(), "Thu Jan  1 00:00:00 1970");

        clock.advance(86_400 + 61);
        assert_eq!(clock.now_secs(), 86_461);
        assert_eq!(clock.timestamp(), "Fri Jan  2 00:01:01 1970");
    }

    #[test]
    fn test_clones_share_time() {
        let clock = ManualClock::at(5);
        let other = clock.clone();
        clock.set(42);
        assert_eq!(other.now_secs(), 42);
    }
}
