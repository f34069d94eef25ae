//! # kafka-forwarder CLI
//!
//! Command-line entry point.
//!
//! Provides:
//! - configuration loading, overrides and validation
//! - forwarder wiring and lifecycle
//! - signal-driven graceful shutdown and exit statuses

mod cli;
mod commands;
mod error;
mod overrides;
mod pipeline;

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use contracts::{FatalKind, ForwarderConfig, LogDestination};
use observability::{ObservabilityConfig, RotatingLog};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_forwarder, run_info, run_validate};
use error::{CliError, Result};

/// How long runtime shutdown waits for a stdin read still blocked in the
/// blocking pool
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(FatalKind::Usage.exit_code())
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::from(FatalKind::Config.exit_code());
        }
    };

    let result = runtime.block_on(execute(&cli));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let kind = e.fatal_kind();
            tracing::error!(error = %e, kind = %kind, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::from(kind.exit_code())
        }
    }
}

async fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run(args) => run_forwarder(cli, args).await,
        Commands::Validate(args) => {
            init_logging(cli, None, None)?;
            run_validate(args)
        }
        Commands::Info(args) => {
            init_logging(cli, None, None)?;
            run_info(args)
        }
    }
}

/// Initialize logging based on CLI options and, for `run`, the error log
pub(crate) fn init_logging(
    cli: &Cli,
    config: Option<&ForwarderConfig>,
    metrics_port: Option<u16>,
) -> Result<()> {
    let error_log = match config {
        Some(config) if config.log_destination == LogDestination::File => {
            let log = RotatingLog::new(
                &config.error_log_path,
                config.max_log_size,
                config.max_log_backups,
            );
            log.ensure_writable().map_err(CliError::ErrorLog)?;
            Some(log)
        }
        _ => None,
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: cli.default_log_level().to_string(),
        error_log,
    })
    .map_err(CliError::Observability)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "kafka-forwarder starting"
    );
    Ok(())
}
