//! Config parsing
//!
//! Supports TOML, JSON and the legacy `key = value` `.conf` format.

use contracts::{ContractError, ForwarderConfig, LogDestination};
use std::path::PathBuf;

/// Config file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
    /// Legacy `key = value` lines with `#` comments
    KeyValue,
}

impl ConfigFormat {
    /// Infer format from a file extension; anything unknown is legacy
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "toml" => Self::Toml,
            "json" => Self::Json,
            _ => Self::KeyValue,
        }
    }
}

/// Parse TOML config
pub fn parse_toml(content: &str) -> Result<ForwarderConfig, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON config
pub fn parse_json(content: &str) -> Result<ForwarderConfig, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse legacy `key = value` config on top of the defaults
///
/// For each known key the first matching line wins. Unknown keys are ignored.
pub fn parse_key_value(content: &str) -> Result<ForwarderConfig, ContractError> {
    let mut config = ForwarderConfig::default();
    let lookup = |key: &str| lookup_key(content, key);

    if let Some(v) = lookup("brokers") {
        config.brokers = v.to_string();
    }
    if let Some(v) = lookup("topic") {
        config.topic = v.to_string();
    }
    if let Some(v) = lookup("partitions") {
        config.partitions = ForwarderConfig::sanitize_partitions(parse_int("partitions", v)?);
    }
    if let Some(v) = lookup("data_path") {
        config.spool_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("error_path") {
        config.error_log_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("queue_sizepath") {
        config.monitor_log_path = PathBuf::from(v);
    }
    if let Some(v) = lookup("logsize_max") {
        config.max_log_size = parse_int("logsize_max", v)?;
    }
    if let Some(v) = lookup("lognum_max") {
        config.max_log_backups = parse_int("lognum_max", v)?;
    }
    if let Some(v) = lookup("monitor_period") {
        config.monitor_period_secs = parse_int("monitor_period", v)?;
    }
    if let Some(v) = lookup("logsavelocal_tag").or_else(|| lookup("savelocal_tag")) {
        config.log_destination = if parse_int::<i64>("logsavelocal_tag", v)? == 0 {
            LogDestination::File
        } else {
            LogDestination::Stderr
        };
    }

    Ok(config)
}

/// Parse config by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<ForwarderConfig, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
        ConfigFormat::KeyValue => parse_key_value(content),
    }
}

/// Find the value of `key` in legacy content
///
/// A line matches when, after leading blanks, it starts with `key` followed by
/// a blank or `=`. The value runs from the first non-`=`/blank character to
/// `#` or end of line.
fn lookup_key<'a>(content: &'a str, key: &str) -> Option<&'a str> {
    content.lines().find_map(|line| {
        let line = line.trim_start_matches([' ', '\t']);
        if line.starts_with('#') {
            return None;
        }
        let rest = line.strip_prefix(key)?;
        if !rest.starts_with([' ', '\t', '=']) {
            return None;
        }
        let value = rest.trim_start_matches([' ', '\t', '=']);
        let end = value.find(['#', '\r', '\n']).unwrap_or(value.len());
        let value = value[..end].trim_end();
        (!value.is_empty()).then_some(value)
    })
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ContractError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ContractError::config_parse(format!("invalid value for '{key}': {e}")))
}
