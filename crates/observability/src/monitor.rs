//! MonitorSampler - periodic broker queue-depth lines
//!
//! Line format: `<timestamp>|<broker-name>| queue size= <n>`

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::clock::{Clock, SystemClock};
use crate::error::LogError;
use crate::metrics::record_broker_pending;
use crate::rotating_log::RotatingLog;

/// Writes one queue-depth line per broker at most once per period
#[derive(Debug)]
pub struct MonitorSampler {
    log: RotatingLog,
    period_secs: u64,
    last_sampled: Option<u64>,
    clock: Arc<dyn Clock>,
}

impl MonitorSampler {
    /// Sampler on the system clock
    pub fn new(log: RotatingLog, period_secs: u64) -> Self {
        Self::with_clock(log, period_secs, Arc::new(SystemClock))
    }

    /// Sampler on an injected clock
    pub fn with_clock(log: RotatingLog, period_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            log,
            period_secs: period_secs.max(1),
            last_sampled: None,
            clock,
        }
    }

    /// Monitor log
    pub fn log(&self) -> &RotatingLog {
        &self.log
    }

    /// Whether a sample taken at `now` would be written
    ///
    /// Only on a period boundary, and only once per boundary no matter how
    /// many call sites ask.
    pub fn is_due(&self, now: u64) -> bool {
        now % self.period_secs == 0 && self.last_sampled != Some(now)
    }

    /// Record queue depths if a sample is due
    ///
    /// Returns `Ok(true)` when lines were written.
    ///
    /// # Errors
    /// Returns the log error when the monitor file cannot be opened or written.
    #[instrument(name = "monitor_sample", skip(self, depths))]
    pub fn sample<'a, I>(&mut self, depths: I) -> Result<bool, LogError>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let now = self.clock.now_secs();
        if !self.is_due(now) {
            return Ok(false);
        }

        let timestamp = self.clock.timestamp();
        let mut block = String::new();
        for (broker, depth) in depths {
            block.push_str(&format_line(&timestamp, broker, depth));
            record_broker_pending(broker, depth);
        }

        // one append per sample so a rotation never splits a sample
        self.log.append(block.as_bytes())?;
        self.last_sampled = Some(now);
        debug!(at = now, "Monitor sample written");
        Ok(true)
    }
}

/// One monitor line, delimiter included
pub fn format_line(timestamp: &str, broker: &str, depth: usize) -> String {
    format!("{timestamp}|{broker}| queue size= {depth}\n")
}
