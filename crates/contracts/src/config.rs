//! ForwarderConfig - Config Loader output
//!
//! Describes the whole forwarder: where to publish, where to spool, and how
//! the rotating logs and the monitor behave.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

use crate::{BrokerEndpoint, ContractError};

/// Partition count used when the configured one is out of range
pub const DEFAULT_PARTITIONS: u32 = 4;

/// Upper bound for the partition count
pub const MAX_PARTITIONS: u32 = 256;

/// Upper bound for numbered log backups
pub const MAX_LOG_BACKUPS: u32 = 9;

/// Where diagnostic events go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDestination {
    /// Rotating error log file (plus stderr)
    #[default]
    File,
    /// stderr only
    Stderr,
}

/// Complete forwarder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Comma-separated broker endpoints
    #[validate(length(min = 1))]
    pub brokers: String,

    /// Destination topic
    #[validate(length(min = 1))]
    pub topic: String,

    /// Partition count; each attempt picks one uniformly
    #[validate(range(min = 1, max = 256))]
    pub partitions: u32,

    /// Spool file holding undelivered messages
    pub spool_path: PathBuf,

    /// Rotating diagnostic log
    pub error_log_path: PathBuf,

    /// Rotating broker queue-depth log
    pub monitor_log_path: PathBuf,

    /// Rotate once the active file reaches this many bytes
    #[validate(range(min = 1))]
    pub max_log_size: u64,

    /// Numbered backups kept per log (`path-0` .. `path-(n-1)`)
    #[validate(range(max = 9))]
    pub max_log_backups: u32,

    /// Monitor sampling period in seconds
    #[validate(range(min = 1))]
    pub monitor_period_secs: u64,

    /// Sleep between failed failover cycles, in milliseconds
    pub retry_backoff_ms: u64,

    /// Consecutive full-pool failures before the fatal flush
    #[validate(range(min = 1))]
    pub max_failure_cycles: u32,

    /// Log a progress line every N messages (0 = never)
    pub progress_interval: u64,

    /// Byte budget of the live input buffer
    #[validate(range(min = 4096))]
    pub input_buffer_bytes: usize,

    /// Diagnostic log destination
    pub log_destination: LogDestination,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            brokers: "localhost:9092".to_string(),
            topic: "topic".to_string(),
            partitions: DEFAULT_PARTITIONS,
            spool_path: PathBuf::from("/var/log/sendkafka/queue.data"),
            error_log_path: PathBuf::from("/var/log/sendkafka/error.log"),
            monitor_log_path: PathBuf::from("/var/log/sendkafka/queuesize.log"),
            max_log_size: 1_000_000,
            max_log_backups: 5,
            monitor_period_secs: 10,
            retry_backoff_ms: 1000,
            max_failure_cycles: 5,
            progress_interval: 100_000,
            input_buffer_bytes: 4 * 1024 * 1024,
            log_destination: LogDestination::File,
        }
    }
}

impl ForwarderConfig {
    /// Parsed broker endpoints
    pub fn endpoints(&self) -> Result<Vec<BrokerEndpoint>, ContractError> {
        BrokerEndpoint::parse_list(&self.brokers)
    }

    /// Backoff between failover cycles
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    /// Monitor sampling period
    pub fn monitor_period(&self) -> Duration {
        Duration::from_secs(self.monitor_period_secs)
    }

    /// Replace an out-of-range partition count with the default
    ///
    /// Mirrors the lenient handling of `partitions` in config files and flags.
    pub fn sanitize_partitions(partitions: i64) -> u32 {
        if partitions <= 0 || partitions > i64::from(MAX_PARTITIONS) {
            DEFAULT_PARTITIONS
        } else {
            partitions as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForwarderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.endpoints().unwrap().len(), 1);
        assert_eq!(config.retry_backoff(), Duration::from_secs(1));
    }

    #[test]
    fn test_out_of_range_fields_fail_validation() {
        let config = ForwarderConfig {
            partitions: 0,
            max_log_backups: 10,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("partitions"));
        assert!(fields.contains_key("max_log_backups"));
    }

    #[test]
    fn test_sanitize_partitions() {
        assert_eq!(ForwarderConfig::sanitize_partitions(0), DEFAULT_PARTITIONS);
        assert_eq!(ForwarderConfig::sanitize_partitions(257), DEFAULT_PARTITIONS);
        assert_eq!(ForwarderConfig::sanitize_partitions(-3), DEFAULT_PARTITIONS);
        assert_eq!(ForwarderConfig::sanitize_partitions(12), 12);
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: ForwarderConfig =
            serde_json::from_str(r#"{ "brokers": "a:1,b:2", "topic": "logs" }"#).unwrap();
        assert_eq!(config.topic, "logs");
        assert_eq!(config.partitions, DEFAULT_PARTITIONS);
        assert_eq!(config.endpoints().unwrap().len(), 2);
    }
}
