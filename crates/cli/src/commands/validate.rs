//! `validate` command implementation.

use contracts::{BrokerEndpoint, ForwarderConfig, LogDestination};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;
use crate::error::{CliError, Result};

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    topic: String,
    partitions: u32,
    broker_count: usize,
    spool_path: String,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        info!(source = %result.source, "Configuration is valid");
        Ok(())
    } else {
        Err(CliError::ValidationFailed)
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let source = args
        .config
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "defaults".to_string());

    match args.config.resolve() {
        Ok((config, source)) => {
            let endpoints = config.endpoints().unwrap_or_default();
            let warnings = collect_warnings(&config, &endpoints);

            ValidationResult {
                valid: true,
                source: source.to_string(),
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    topic: config.topic.clone(),
                    partitions: config.partitions,
                    broker_count: endpoints.len(),
                    spool_path: config.spool_path.display().to_string(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            source,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &ForwarderConfig, endpoints: &[BrokerEndpoint]) -> Vec<String> {
    let mut warnings = Vec::new();

    if endpoints.len() == 1 {
        warnings.push("Only one broker configured - no failover target".to_string());
    }

    if endpoints
        .iter()
        .any(|e| matches!(e, BrokerEndpoint::Mock(_)))
    {
        warnings.push("mock: endpoints deliver to memory only".to_string());
    }

    if config.retry_backoff_ms == 0 {
        warnings.push("retry_backoff_ms is 0 - failure cycles will not pause".to_string());
    }

    if config.max_log_backups == 0 {
        warnings.push("max_log_backups is 0 - logs are truncated on rotation".to_string());
    }

    if config.log_destination == LogDestination::Stderr {
        warnings.push("log_destination is stderr - no error log is written".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.source);

        if let Some(ref summary) = result.summary {
            println!("\n  Topic: {}", summary.topic);
            println!("  Partitions: {}", summary.partitions);
            println!("  Brokers: {}", summary.broker_count);
            println!("  Spool: {}", summary.spool_path);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.source);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ConfigArgs;
    use tempfile::tempdir;

    fn args(config: ConfigArgs) -> ValidateArgs {
        ValidateArgs {
            config,
            json: false,
        }
    }

    #[test]
    fn test_single_broker_warning() {
        let config = ForwarderConfig {
            brokers: "k1:9092".to_string(),
            ..Default::default()
        };
        let endpoints = config.endpoints().unwrap();
        let warnings = collect_warnings(&config, &endpoints);
        assert!(warnings.iter().any(|w| w.contains("one broker")));
    }

    #[test]
    fn test_invalid_file_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "partitions = \"many\"\n").unwrap();

        let result = validate_config(&args(ConfigArgs {
            config: Some(path),
            ..Default::default()
        }));
        assert!(!result.valid);
        assert!(result.error.is_some());
        assert!(result.summary.is_none());
    }

    #[test]
    fn test_valid_file_summary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("forwarder.toml");
        std::fs::write(&path, "brokers = \"k1:9092,k2:9093\"\ntopic = \"events\"\n").unwrap();

        let result = validate_config(&args(ConfigArgs {
            config: Some(path),
            ..Default::default()
        }));
        assert!(result.valid);
        let summary = result.summary.unwrap();
        assert_eq!(summary.topic, "events");
        assert_eq!(summary.broker_count, 2);
    }
}
