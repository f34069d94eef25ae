//! `run` command implementation.

use contracts::ForwarderConfig;
use dispatcher::ShutdownFlag;
use tracing::{info, warn};

use crate::cli::{Cli, RunArgs};
use crate::error::{CliError, Result};
use crate::pipeline::{print_run_report, spawn_signal_listener, Forwarder};

/// Execute the `run` command
pub async fn run_forwarder(cli: &Cli, args: &RunArgs) -> Result<()> {
    let (config, source) = args.config.resolve()?;

    let metrics_port = (args.metrics_port != 0).then_some(args.metrics_port);
    crate::init_logging(cli, Some(&config), metrics_port)?;

    info!(
        source = %source,
        brokers = %config.brokers,
        topic = %config.topic,
        partitions = config.partitions,
        spool = %config.spool_path.display(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let shutdown = ShutdownFlag::new();
    let signals = spawn_signal_listener(shutdown.clone()).map_err(CliError::Signal)?;

    info!("Starting forwarder...");
    let result = Forwarder::new(config, shutdown.clone())
        .run(tokio::io::stdin())
        .await;
    signals.abort();

    let report = result?;
    if shutdown.is_triggered() {
        warn!(sent = report.sent, spooled = report.spooled, "Stopped by signal");
    }
    info!(
        sent = report.sent,
        replayed = report.replayed,
        spooled = report.spooled,
        "Forwarder finished"
    );
    print_run_report(&report);

    Ok(())
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &ForwarderConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Brokers: {}", config.brokers);
    println!("Topic: {} ({} partitions)", config.topic, config.partitions);
    println!("\nFiles:");
    println!("  Spool: {}", config.spool_path.display());
    println!("  Error log: {}", config.error_log_path.display());
    println!("  Monitor log: {}", config.monitor_log_path.display());
    println!(
        "  Rotation: {} bytes, {} backups",
        config.max_log_size, config.max_log_backups
    );
    println!("\nDelivery:");
    println!("  Retry backoff: {} ms", config.retry_backoff_ms);
    println!("  Failure cycles before flush: {}", config.max_failure_cycles);
    println!("  Monitor period: {} s", config.monitor_period_secs);
    println!();
}
