//! Layered error definitions
//!
//! Categorized by source: config / broker / spool / log

use thiserror::Error;

use crate::FatalKind;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    /// Endpoint list could not be parsed
    #[error("invalid broker endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    // ===== Broker Errors =====
    /// Broker connection error
    #[error("broker '{endpoint}' connection error: {message}")]
    BrokerConnection { endpoint: String, message: String },

    /// Publish rejected by broker client
    #[error("broker '{broker}' publish error: {message}")]
    Publish { broker: String, message: String },

    /// Pending backlog could not be drained
    #[error("broker '{broker}' drain error: {message}")]
    Drain { broker: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create invalid endpoint error
    pub fn invalid_endpoint(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create broker connection error
    pub fn broker_connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrokerConnection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(broker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            broker: broker.into(),
            message: message.into(),
        }
    }

    /// Create drain error
    pub fn drain(broker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Drain {
            broker: broker.into(),
            message: message.into(),
        }
    }

    /// Exit status class when this error ends the process
    pub fn fatal_kind(&self) -> FatalKind {
        match self {
            Self::ConfigParse { .. } | Self::ConfigValidation { .. } | Self::InvalidEndpoint { .. } => {
                FatalKind::Config
            }
            Self::BrokerConnection { .. } => FatalKind::BrokerConnect,
            Self::Publish { .. } => FatalKind::AllBrokersDown,
            Self::Drain { .. } => FatalKind::SpoolPersist,
            Self::Io(_) | Self::Other(_) => FatalKind::Config,
        }
    }
}
