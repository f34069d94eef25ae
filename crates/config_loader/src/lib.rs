//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML / JSON / legacy `key = value` configuration files
//! - Validate configuration legality
//! - Generate `ForwarderConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("/etc/sendkafka/forwarder.conf")).unwrap();
//! println!("Topic: {}", config.topic);
//! ```

mod parser;
mod validator;

pub use contracts::ForwarderConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Detects format from file extension (.toml / .json, anything else is
    /// the legacy `key = value` format).
    ///
    /// # Errors
    /// - File read failure
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ForwarderConfig, ContractError> {
        let format = Self::detect_format(path);
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ForwarderConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate a config assembled elsewhere (e.g. after CLI overrides)
    pub fn validate(config: &ForwarderConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize ForwarderConfig to TOML string
    pub fn to_toml(config: &ForwarderConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ForwarderConfig to JSON string
    pub fn to_json(config: &ForwarderConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> ConfigFormat {
        path.extension()
            .and_then(|e| e.to_str())
            .map(ConfigFormat::from_extension)
            .unwrap_or(ConfigFormat::KeyValue)
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ForwarderConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}
