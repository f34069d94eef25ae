//! Endpoint → adapter resolution

use contracts::{BrokerConnector, BrokerEndpoint, BrokerHandle, ContractError, Message};
use tracing::instrument;

use crate::file::FileBroker;
use crate::mock::{MockBroker, MockRegistry};
use crate::tcp::{TcpBroker, TcpBrokerConfig, DEFAULT_MAX_PENDING};

/// Any of the supported broker adapters
///
/// Async trait methods are not object safe, so the pool holds this enum
/// instead of `Box<dyn BrokerHandle>`.
#[derive(Debug)]
pub enum AnyBroker {
    Tcp(TcpBroker),
    File(FileBroker),
    Mock(MockBroker),
}

impl BrokerHandle for AnyBroker {
    fn name(&self) -> &str {
        match self {
            Self::Tcp(b) => b.name(),
            Self::File(b) => b.name(),
            Self::Mock(b) => b.name(),
        }
    }

    async fn publish(
        &mut self,
        topic: &str,
        partition: u32,
        message: &Message,
    ) -> Result<(), ContractError> {
        match self {
            Self::Tcp(b) => b.publish(topic, partition, message).await,
            Self::File(b) => b.publish(topic, partition, message).await,
            Self::Mock(b) => b.publish(topic, partition, message).await,
        }
    }

    fn pending_count(&self) -> usize {
        match self {
            Self::Tcp(b) => b.pending_count(),
            Self::File(b) => b.pending_count(),
            Self::Mock(b) => b.pending_count(),
        }
    }

    async fn drain_pending(&mut self) -> Result<Vec<Message>, ContractError> {
        match self {
            Self::Tcp(b) => b.drain_pending().await,
            Self::File(b) => b.drain_pending().await,
            Self::Mock(b) => b.drain_pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        match self {
            Self::Tcp(b) => b.close().await,
            Self::File(b) => b.close().await,
            Self::Mock(b) => b.close().await,
        }
    }
}

/// Connects each endpoint with the adapter its scheme names
#[derive(Debug, Clone)]
pub struct EndpointConnector {
    mocks: MockRegistry,
    max_pending: usize,
}

impl Default for EndpointConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointConnector {
    pub fn new() -> Self {
        Self::with_mocks(MockRegistry::new())
    }

    /// Connector whose `mock:` endpoints resolve through `mocks`
    pub fn with_mocks(mocks: MockRegistry) -> Self {
        Self {
            mocks,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }

    /// Bound on each TCP broker's local queue
    pub fn max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn mocks(&self) -> &MockRegistry {
        &self.mocks
    }
}

impl BrokerConnector for EndpointConnector {
    type Handle = AnyBroker;

    #[instrument(name = "broker_connect", skip(self), fields(endpoint = %endpoint))]
    async fn connect(&self, endpoint: &BrokerEndpoint) -> Result<AnyBroker, ContractError> {
        let broker = match endpoint {
            BrokerEndpoint::Tcp { host, port } => {
                let mut config = TcpBrokerConfig::new(host.clone(), *port);
                config.max_pending = self.max_pending;
                AnyBroker::Tcp(TcpBroker::connect(config).await?)
            }
            BrokerEndpoint::File(path) => AnyBroker::File(FileBroker::connect(path.clone()).await?),
            BrokerEndpoint::Mock(name) => {
                let state = self.mocks.state(name);
                AnyBroker::Mock(MockBroker::connect(endpoint.name(), state)?)
            }
        };
        Ok(broker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockConfig;

    #[tokio::test]
    async fn test_mock_endpoint_shares_registry_state() {
        let connector = EndpointConnector::new();
        let state = connector.mocks().state("a");

        let endpoint: BrokerEndpoint = "mock:a".parse().unwrap();
        let mut broker = connector.connect(&endpoint).await.unwrap();
        assert_eq!(broker.name(), "mock:a");

        broker.publish("t", 0, &Message::from("hi\n")).await.unwrap();
        assert_eq!(state.delivered_text(), vec!["hi\n"]);
    }

    #[tokio::test]
    async fn test_refused_mock_maps_to_connection_error() {
        let registry = MockRegistry::new();
        registry.configure(
            "down",
            MockConfig {
                refuse_connect: true,
                ..Default::default()
            },
        );
        let connector = EndpointConnector::with_mocks(registry);

        let endpoint: BrokerEndpoint = "mock:down".parse().unwrap();
        let err = connector.connect(&endpoint).await.unwrap_err();
        assert!(matches!(err, ContractError::BrokerConnection { .. }));
    }

    #[tokio::test]
    async fn test_file_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.log");
        let endpoint = BrokerEndpoint::File(path.clone());

        let mut broker = EndpointConnector::new().connect(&endpoint).await.unwrap();
        assert!(matches!(broker, AnyBroker::File(_)));
        broker.publish("t", 0, &Message::from("rec")).await.unwrap();
        broker.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "rec\n");
    }
}
