//! Error types for CLI operations.

use std::path::PathBuf;

use contracts::{ContractError, FatalKind};
use dispatcher::DispatcherError;
use observability::LogError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Explicitly requested configuration file is missing
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse or validation error
    #[error("Invalid configuration: {0}")]
    Config(#[from] ContractError),

    /// `validate` found the configuration unusable
    #[error("Configuration validation failed")]
    ValidationFailed,

    /// Error log cannot be opened
    #[error("Failed to open error log: {0}")]
    ErrorLog(#[source] LogError),

    /// Monitor log cannot be opened
    #[error("Failed to open monitor log: {0}")]
    MonitorLog(#[source] LogError),

    /// Tracing or metrics setup failed
    #[error("Failed to initialize observability: {0:#}")]
    Observability(anyhow::Error),

    /// Signal handlers cannot be installed
    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),

    /// Forwarding stopped on a fatal condition
    #[error(transparent)]
    Dispatch(#[from] DispatcherError),

    /// Rendering command output failed
    #[error("Failed to render output: {0}")]
    Output(String),
}

impl CliError {
    /// Exit status class
    pub fn fatal_kind(&self) -> FatalKind {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ValidationFailed
            | Self::Observability(_)
            | Self::Signal(_)
            | Self::Output(_) => FatalKind::Config,
            Self::Config(e) => e.fatal_kind(),
            Self::ErrorLog(_) => FatalKind::ErrorLogOpen,
            Self::MonitorLog(_) => FatalKind::MonitorLogOpen,
            Self::Dispatch(e) => e.fatal_kind(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn open_error() -> LogError {
        LogError::Open {
            path: PathBuf::from("/nonexistent/x.log"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::ErrorLog(open_error()).fatal_kind().exit_code(), 4);
        assert_eq!(CliError::MonitorLog(open_error()).fatal_kind().exit_code(), 3);
        assert_eq!(
            CliError::ConfigNotFound {
                path: PathBuf::from("a.toml")
            }
            .fatal_kind()
            .exit_code(),
            1
        );
        assert_eq!(
            CliError::Dispatch(DispatcherError::NoBrokers)
                .fatal_kind()
                .exit_code(),
            1
        );
    }

    #[test]
    fn test_config_error_keeps_kind() {
        let err = CliError::from(ContractError::config_validation("topic", "empty"));
        assert_eq!(err.fatal_kind(), FatalKind::Config);
        assert!(err.to_string().contains("topic"));
    }
}
