//! Effective configuration: defaults, then the config file, then flags and
//! `FORWARDER_*` variables.

use std::path::{Path, PathBuf};

use config_loader::ConfigLoader;
use contracts::ForwarderConfig;
use tracing::debug;

use crate::cli::{ConfigArgs, DEFAULT_CONFIG_PATH};
use crate::error::{CliError, Result};

/// Where the file layer of the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

impl ConfigArgs {
    /// Build and validate the effective configuration
    ///
    /// An explicit `--config` must exist. The default path is optional and
    /// the built-in defaults are used when it is absent.
    pub fn resolve(&self) -> Result<(ForwarderConfig, ConfigSource)> {
        self.resolve_with_default(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub(crate) fn resolve_with_default(
        &self,
        default_path: &Path,
    ) -> Result<(ForwarderConfig, ConfigSource)> {
        let (base, source) = match &self.config {
            Some(path) if !path.exists() => {
                return Err(CliError::ConfigNotFound { path: path.clone() });
            }
            Some(path) => (ConfigLoader::load_from_path(path)?, ConfigSource::File(path.clone())),
            None if default_path.exists() => (
                ConfigLoader::load_from_path(default_path)?,
                ConfigSource::File(default_path.to_path_buf()),
            ),
            None => (ForwarderConfig::default(), ConfigSource::Defaults),
        };

        let config = self.apply(base);
        ConfigLoader::validate(&config)?;
        debug!(source = %source, "Configuration resolved");
        Ok((config, source))
    }

    /// Overlay every field given on the command line or in the environment
    pub fn apply(&self, mut config: ForwarderConfig) -> ForwarderConfig {
        if let Some(brokers) = &self.brokers {
            config.brokers = brokers.clone();
        }
        if let Some(topic) = &self.topic {
            config.topic = topic.clone();
        }
        if let Some(partitions) = self.partitions {
            config.partitions = ForwarderConfig::sanitize_partitions(partitions);
        }
        if let Some(path) = &self.spool_path {
            config.spool_path = path.clone();
        }
        if let Some(path) = &self.error_log {
            config.error_log_path = path.clone();
        }
        if let Some(path) = &self.monitor_log {
            config.monitor_log_path = path.clone();
        }
        if let Some(size) = self.max_log_size {
            config.max_log_size = size;
        }
        if let Some(backups) = self.max_log_backups {
            config.max_log_backups = backups;
        }
        if let Some(period) = self.monitor_period {
            config.monitor_period_secs = period;
        }
        if let Some(backoff) = self.retry_backoff_ms {
            config.retry_backoff_ms = backoff;
        }
        if let Some(cycles) = self.max_failure_cycles {
            config.max_failure_cycles = cycles;
        }
        if let Some(interval) = self.progress_interval {
            config.progress_interval = interval;
        }
        if let Some(destination) = self.log_destination {
            config.log_destination = destination.into();
        }
        config
    }
}
