//! Config validation
//!
//! Rules:
//! - field ranges (partitions, backups, periods) via the `Validate` derive
//! - broker list parses into at least one endpoint
//! - spool, error log and monitor log are three distinct paths

use std::collections::HashSet;

use contracts::{ContractError, ForwarderConfig};
use ::validator::Validate;

/// Validate a ForwarderConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &ForwarderConfig) -> Result<(), ContractError> {
    validate_ranges(config)?;
    validate_brokers(config)?;
    validate_paths(config)?;
    Ok(())
}

/// Field range checks
fn validate_ranges(config: &ForwarderConfig) -> Result<(), ContractError> {
    config.validate().map_err(|errors| {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.keys().map(|k| k.to_string()).collect();
        fields.sort();
        ContractError::config_validation(fields.join(", "), errors.to_string())
    })
}

/// Broker list must parse
fn validate_brokers(config: &ForwarderConfig) -> Result<(), ContractError> {
    config
        .endpoints()
        .map(|_| ())
        .map_err(|e| ContractError::config_validation("brokers", e.to_string()))
}

/// Spool and log files must not collide
fn validate_paths(config: &ForwarderConfig) -> Result<(), ContractError> {
    let paths = [
        ("spool_path", &config.spool_path),
        ("error_log_path", &config.error_log_path),
        ("monitor_log_path", &config.monitor_log_path),
    ];

    let mut seen = HashSet::new();
    for (field, path) in paths {
        if path.as_os_str().is_empty() {
            return Err(ContractError::config_validation(field, "path cannot be empty"));
        }
        if !seen.insert(path) {
            return Err(ContractError::config_validation(
                field,
                format!("duplicate path '{}'", path.display()),
            ));
        }
    }
    Ok(())
}
