//! Dispatcher error types

use contracts::{ContractError, FatalKind};
use observability::LogError;
use spool::SpoolError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Pool built with no endpoints
    #[error("no brokers configured")]
    NoBrokers,

    /// A broker could not be connected at startup
    #[error("failed to connect broker '{endpoint}': {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: ContractError,
    },

    /// Every broker failed for one message, `cycles` times in a row
    #[error("all broker(s) down: topic '{topic}', {cycles} failure cycles")]
    AllBrokersDown { topic: String, cycles: u32 },

    /// Spool read/write error
    #[error(transparent)]
    Spool(#[from] SpoolError),

    /// Monitor log error
    #[error("monitor log error: {0}")]
    Monitor(#[from] LogError),
}

impl DispatcherError {
    /// Create a connect error
    pub fn connect(endpoint: impl Into<String>, source: ContractError) -> Self {
        Self::Connect {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Exit class for this error
    pub fn fatal_kind(&self) -> FatalKind {
        match self {
            Self::NoBrokers => FatalKind::Config,
            Self::Connect { .. } => FatalKind::BrokerConnect,
            Self::AllBrokersDown { .. } => FatalKind::AllBrokersDown,
            Self::Spool(e) => e.fatal_kind(),
            Self::Monitor(_) => FatalKind::MonitorLogOpen,
        }
    }
}
