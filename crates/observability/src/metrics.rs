//! Forwarder metrics
//!
//! Prometheus counters/gauges via the `metrics` facade, plus an in-memory
//! aggregator for the end-of-run summary.

use std::collections::HashMap;

use metrics::{counter, gauge, histogram};

/// Record one publish attempt against a broker
pub fn record_publish_attempt(broker: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "forwarder_publish_attempts_total",
        "broker" => broker.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if !success {
        counter!(
            "forwarder_publish_failures_total",
            "broker" => broker.to_string()
        )
        .increment(1);
    }
}

/// Record a delivered message and how many attempts it took
pub fn record_message_published(attempts: u32) {
    counter!("forwarder_messages_published_total").increment(1);
    histogram!("forwarder_attempts_per_message").record(f64::from(attempts));
}

/// Record a failover cycle in which every broker failed
pub fn record_retry_cycle() {
    counter!("forwarder_retry_cycles_total").increment(1);
}

/// Record a message read back from the spool
pub fn record_message_replayed() {
    counter!("forwarder_messages_replayed_total").increment(1);
}

/// Record messages written to the spool
pub fn record_messages_spooled(count: usize) {
    counter!("forwarder_messages_spooled_total").increment(count as u64);
}

/// Record a broker's pending-delivery depth
pub fn record_broker_pending(broker: &str, depth: usize) {
    gauge!(
        "forwarder_broker_pending",
        "broker" => broker.to_string()
    )
    .set(depth as f64);
}

/// Record live input buffer occupancy in bytes
pub fn record_input_buffer_bytes(bytes: usize) {
    gauge!("forwarder_input_buffer_bytes").set(bytes as f64);
}

/// In-memory delivery statistics
#[derive(Debug, Clone, Default)]
pub struct DeliveryMetricsAggregator {
    /// Messages delivered
    pub delivered: u64,

    /// Failed publish attempts (single broker)
    pub publish_failures: u64,

    /// Cycles in which every broker failed
    pub retry_cycles: u64,

    /// Attempts needed per delivered message
    pub attempt_stats: RunningStats,

    /// Failed attempts per broker
    pub broker_failures: HashMap<String, u64>,
}

impl DeliveryMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a failed attempt against `broker`
    pub fn record_failure(&mut self, broker: &str) {
        self.publish_failures += 1;
        *self.broker_failures.entry(broker.to_string()).or_insert(0) += 1;
    }

    /// Count a full-pool failure cycle
    pub fn record_cycle(&mut self) {
        self.retry_cycles += 1;
    }

    /// Count a delivered message
    pub fn record_delivery(&mut self, attempts: u32) {
        self.delivered += 1;
        self.attempt_stats.push(f64::from(attempts));
    }

    /// Summary report
    pub fn summary(&self) -> DeliverySummary {
        DeliverySummary {
            delivered: self.delivered,
            publish_failures: self.publish_failures,
            retry_cycles: self.retry_cycles,
            attempts: StatsSummary::from(&self.attempt_stats),
            broker_failures: self.broker_failures.clone(),
        }
    }
}

/// Delivery summary
#[derive(Debug, Clone, Default)]
pub struct DeliverySummary {
    pub delivered: u64,
    pub publish_failures: u64,
    pub retry_cycles: u64,
    pub attempts: StatsSummary,
    pub broker_failures: HashMap<String, u64>,
}

impl std::fmt::Display for DeliverySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Delivery Summary ===")?;
        writeln!(f, "Delivered: {}", self.delivered)?;
        writeln!(f, "Failed attempts: {}", self.publish_failures)?;
        writeln!(f, "Full-pool failure cycles: {}", self.retry_cycles)?;
        writeln!(f, "Attempts per message: {}", self.attempts)?;

        if !self.broker_failures.is_empty() {
            let mut brokers: Vec<_> = self.broker_failures.iter().collect();
            brokers.sort();
            writeln!(f, "Failures by broker:")?;
            for (broker, count) in brokers {
                writeln!(f, "  {}: {}", broker, count)?;
            }
        }

        Ok(())
    }
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
