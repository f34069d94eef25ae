//! # Observability
//!
//! Logging, rotating log files, broker queue monitoring and Prometheus metrics.
//!
//! ## Features
//!
//! - Tracing initialization (JSON / Pretty / Compact on stderr)
//! - Optional copy of every event into a size-bounded rotating error log
//! - Broker queue-depth monitor with a once-per-period gate
//! - Prometheus metrics export
//!
//! ## Example
//!
//! ```ignore
//! use observability::{ObservabilityConfig, RotatingLog};
//!
//! observability::init_with_config(ObservabilityConfig {
//!     error_log: Some(RotatingLog::new("/var/log/sendkafka/error.log", 1_000_000, 5)),
//!     ..Default::default()
//! })?;
//! ```

pub mod clock;
pub mod error;
pub mod metrics;
pub mod monitor;
pub mod rotating_log;
pub mod rotation;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::clock::{Clock, ManualClock, SystemClock, TIMESTAMP_FORMAT};
pub use crate::error::LogError;
pub use crate::metrics::{
    record_broker_pending, record_input_buffer_bytes, record_message_published,
    record_message_replayed, record_messages_spooled, record_publish_attempt, record_retry_cycle,
    DeliveryMetricsAggregator, DeliverySummary, RunningStats, StatsSummary,
};
pub use crate::monitor::MonitorSampler;
pub use crate::rotating_log::{RotatingLog, RotatingWriter};

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log format on stderr
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Default filter when `RUST_LOG` is unset
    pub default_log_level: String,
    /// Rotating error log that also receives every event (None = stderr only)
    pub error_log: Option<RotatingLog>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Compact,
            metrics_port: None,
            default_log_level: "info".to_string(),
            error_log: None,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logs
    Json,
    /// Human-readable multi-line
    Pretty,
    /// Compact single-line
    #[default]
    Compact,
}

/// Initialize tracing (and Prometheus, if a port is set)
///
/// # Errors
/// Fails when the error log cannot be opened, a global subscriber is already
/// installed, or the Prometheus listener cannot be bound.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    // 1. Tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let stderr_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(std::io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(std::io::stderr).boxed(),
    };

    let file_layer = match config.error_log {
        Some(log) => {
            log.ensure_writable()
                .with_context(|| format!("Failed to open error log {}", log.path().display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(RotatingWriter::new(log)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    // 2. Prometheus exporter (if enabled)
    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "Observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus recorder (tracing set up elsewhere)
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port = port, "Prometheus metrics endpoint initialized");
    Ok(())
}
