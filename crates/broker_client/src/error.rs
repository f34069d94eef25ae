//! Broker adapter errors

use contracts::{ContractError, FatalKind};
use thiserror::Error;

/// Errors raised by the broker adapters
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Endpoint could not be reached at setup
    #[error("failed to connect to '{endpoint}': {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be handed to the broker
    #[error("broker '{broker}' rejected record: {message}")]
    Rejected { broker: String, message: String },

    /// Local delivery queue is full
    #[error("broker '{broker}' queue full ({capacity} records)")]
    QueueFull { broker: String, capacity: usize },

    /// Handle used after close
    #[error("broker '{broker}' is closed")]
    Closed { broker: String },

    /// IO error while writing
    #[error("broker '{broker}' io error: {source}")]
    Io {
        broker: String,
        #[source]
        source: std::io::Error,
    },
}

impl BrokerError {
    pub fn rejected(broker: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            broker: broker.into(),
            message: message.into(),
        }
    }

    pub fn io(broker: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            broker: broker.into(),
            source,
        }
    }

    /// Exit class if this error ends the process
    pub fn fatal_kind(&self) -> FatalKind {
        match self {
            Self::Connect { .. } => FatalKind::BrokerConnect,
            _ => FatalKind::AllBrokersDown,
        }
    }
}

impl From<BrokerError> for ContractError {
    fn from(err: BrokerError) -> Self {
        match &err {
            BrokerError::Connect { endpoint, .. } => {
                ContractError::broker_connection(endpoint.clone(), err.to_string())
            }
            BrokerError::Rejected { broker, .. }
            | BrokerError::QueueFull { broker, .. }
            | BrokerError::Closed { broker }
            | BrokerError::Io { broker, .. } => ContractError::publish(broker.clone(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_maps_to_broker_connect() {
        let err = BrokerError::Connect {
            endpoint: "k1:9092".into(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(err.fatal_kind(), FatalKind::BrokerConnect);

        let contract: ContractError = err.into();
        assert!(matches!(contract, ContractError::BrokerConnection { .. }));
        assert_eq!(contract.fatal_kind(), FatalKind::BrokerConnect);
    }

    #[test]
    fn test_publish_errors_map_to_publish() {
        let err = BrokerError::QueueFull {
            broker: "k1:9092".into(),
            capacity: 8,
        };
        let contract: ContractError = err.into();
        assert!(matches!(contract, ContractError::Publish { .. }));
        assert!(contract.to_string().contains("queue full"));
    }
}
