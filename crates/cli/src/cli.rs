//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Config file read when `--config` is not given and the file exists
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sendkafka/sendkafka.conf";

/// kafka-forwarder - durable, failover-aware line forwarder
#[derive(Parser, Debug)]
#[command(
    name = "kafka-forwarder",
    author,
    version,
    about = "Forward newline-delimited records from stdin to a broker pool",
    long_about = "Reads newline-delimited records from standard input and publishes each one \n\
                  to a pool of brokers with random failover. Messages that cannot be \n\
                  delivered are spooled to disk and replayed on the next start."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FORWARDER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "FORWARDER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Filter used when `RUST_LOG` is unset
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Forward stdin to the broker pool
    Run(RunArgs),

    /// Validate the effective configuration without running
    Validate(ValidateArgs),

    /// Display the effective configuration
    Info(InfoArgs),
}

/// Config file plus per-field overrides
///
/// Precedence: defaults < config file < environment < flags.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Configuration file (.toml, .json, or legacy key = value)
    #[arg(short, long, env = "FORWARDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Comma-separated broker endpoints
    #[arg(short, long, env = "FORWARDER_BROKERS")]
    pub brokers: Option<String>,

    /// Destination topic
    #[arg(short, long, env = "FORWARDER_TOPIC")]
    pub topic: Option<String>,

    /// Partition count (out of 1..=256 falls back to 4)
    #[arg(short, long, env = "FORWARDER_PARTITIONS", allow_negative_numbers = true)]
    pub partitions: Option<i64>,

    /// Spool file for undelivered messages
    #[arg(short = 'o', long, env = "FORWARDER_SPOOL_PATH")]
    pub spool_path: Option<PathBuf>,

    /// Rotating error log
    #[arg(short = 'x', long, env = "FORWARDER_ERROR_LOG")]
    pub error_log: Option<PathBuf>,

    /// Rotating queue-depth monitor log
    #[arg(short, long, env = "FORWARDER_MONITOR_LOG")]
    pub monitor_log: Option<PathBuf>,

    /// Rotate logs once they reach this many bytes
    #[arg(short = 'l', long, env = "FORWARDER_MAX_LOG_SIZE")]
    pub max_log_size: Option<u64>,

    /// Numbered backups kept per log (0..=9)
    #[arg(short = 'n', long, env = "FORWARDER_MAX_LOG_BACKUPS")]
    pub max_log_backups: Option<u32>,

    /// Monitor sampling period in seconds
    #[arg(short = 'd', long, env = "FORWARDER_MONITOR_PERIOD")]
    pub monitor_period: Option<u64>,

    /// Sleep between failed failover cycles, in milliseconds
    #[arg(long, env = "FORWARDER_RETRY_BACKOFF_MS")]
    pub retry_backoff_ms: Option<u64>,

    /// Consecutive full-pool failures before the fatal flush
    #[arg(long, env = "FORWARDER_MAX_FAILURE_CYCLES")]
    pub max_failure_cycles: Option<u32>,

    /// Log progress every N messages (0 = never)
    #[arg(long, env = "FORWARDER_PROGRESS_INTERVAL")]
    pub progress_interval: Option<u64>,

    /// Where diagnostic events go
    #[arg(short = 'r', long, value_enum, env = "FORWARDER_LOG_DESTINATION")]
    pub log_destination: Option<LogDestinationArg>,
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Validate configuration and exit without forwarding
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FORWARDER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Also list the parsed broker endpoints
    #[arg(long)]
    pub endpoints: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// `--log-destination` values
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogDestinationArg {
    /// Rotating error log plus stderr
    File,
    /// stderr only
    Stderr,
}

impl From<LogDestinationArg> for contracts::LogDestination {
    fn from(arg: LogDestinationArg) -> Self {
        match arg {
            LogDestinationArg::File => Self::File,
            LogDestinationArg::Stderr => Self::Stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "kafka-forwarder",
            "run",
            "-b",
            "k1:9092,k2",
            "-t",
            "logs",
            "-p",
            "8",
            "-o",
            "/tmp/q.data",
            "-n",
            "3",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.config.brokers.as_deref(), Some("k1:9092,k2"));
        assert_eq!(args.config.topic.as_deref(), Some("logs"));
        assert_eq!(args.config.partitions, Some(8));
        assert_eq!(args.config.max_log_backups, Some(3));
        assert_eq!(args.metrics_port, 0);
    }

    #[test]
    fn test_negative_partitions_accepted() {
        let cli = Cli::try_parse_from(["kafka-forwarder", "validate", "-p", "-3"]).unwrap();
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.config.partitions, Some(-3));
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["kafka-forwarder", "-vv", "info"]).unwrap();
        assert_eq!(cli.default_log_level(), "trace");

        let cli = Cli::try_parse_from(["kafka-forwarder", "-q", "info"]).unwrap();
        assert_eq!(cli.default_log_level(), "warn");
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["kafka-forwarder", "-q", "-v", "info"]).is_err());
    }
}
