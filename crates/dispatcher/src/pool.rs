//! BrokerPool - the connected broker handles plus the queue-depth monitor

use contracts::{BrokerConnector, BrokerEndpoint, BrokerHandle, ContractError, Message};
use observability::{LogError, MonitorSampler};
use tracing::{info, instrument, warn};

use crate::error::DispatcherError;

/// Connected broker handles, in endpoint order
#[derive(Debug)]
pub struct BrokerPool<H> {
    handles: Vec<H>,
    monitor: MonitorSampler,
}

impl<H: BrokerHandle> BrokerPool<H> {
    /// Connect every endpoint, all or nothing
    ///
    /// When one endpoint fails, the handles already connected are closed and
    /// the error is returned.
    #[instrument(
        name = "broker_pool_connect",
        skip(connector, endpoints, monitor),
        fields(brokers = endpoints.len())
    )]
    pub async fn connect<C>(
        connector: &C,
        endpoints: &[BrokerEndpoint],
        monitor: MonitorSampler,
    ) -> Result<Self, DispatcherError>
    where
        C: BrokerConnector<Handle = H>,
    {
        if endpoints.is_empty() {
            return Err(DispatcherError::NoBrokers);
        }

        let mut handles = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            match connector.connect(endpoint).await {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!(endpoint = %endpoint, error = %e, "Broker connect failed, closing pool");
                    close_handles(&mut handles).await;
                    return Err(DispatcherError::connect(endpoint.name(), e));
                }
            }
        }

        info!(brokers = handles.len(), "Broker pool connected");
        Ok(Self { handles, monitor })
    }

    /// Pool over handles that are already connected
    pub fn from_handles(handles: Vec<H>, monitor: MonitorSampler) -> Result<Self, DispatcherError> {
        if handles.is_empty() {
            return Err(DispatcherError::NoBrokers);
        }
        Ok(Self { handles, monitor })
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Display name of broker `index`
    pub fn name(&self, index: usize) -> &str {
        self.handles[index].name()
    }

    pub fn names(&self) -> Vec<&str> {
        self.handles.iter().map(|h| h.name()).collect()
    }

    /// One publish attempt on broker `index`
    pub async fn publish_attempt(
        &mut self,
        index: usize,
        topic: &str,
        partition: u32,
        message: &Message,
    ) -> Result<(), ContractError> {
        self.handles[index].publish(topic, partition, message).await
    }

    /// Pending-delivery count of broker `index`
    pub fn pending_count(&self, index: usize) -> usize {
        self.handles[index].pending_count()
    }

    /// Sum of every broker's pending count
    pub fn total_pending(&self) -> usize {
        self.handles.iter().map(|h| h.pending_count()).sum()
    }

    /// Write queue depths to the monitor log if a sample is due
    pub fn sample_monitor(&mut self) -> Result<bool, LogError> {
        let depths = self.handles.iter().map(|h| (h.name(), h.pending_count()));
        self.monitor.sample(depths)
    }

    pub fn monitor(&self) -> &MonitorSampler {
        &self.monitor
    }

    /// Take every broker's undelivered backlog, broker by broker, in
    /// delivery order
    ///
    /// A broker whose drain fails contributes nothing and is logged.
    #[instrument(name = "broker_pool_drain_all", skip(self))]
    pub async fn drain_all(&mut self) -> Vec<(usize, Message)> {
        let mut drained = Vec::new();
        for (index, handle) in self.handles.iter_mut().enumerate() {
            match handle.drain_pending().await {
                Ok(messages) => drained.extend(messages.into_iter().map(|m| (index, m))),
                Err(e) => warn!(broker = %handle.name(), error = %e, "Drain failed"),
            }
        }
        drained
    }

    /// Close every handle
    pub async fn close_all(&mut self) {
        close_handles(&mut self.handles).await;
    }
}

async fn close_handles<H: BrokerHandle>(handles: &mut [H]) {
    for handle in handles.iter_mut() {
        if let Err(e) = handle.close().await {
            warn!(broker = %handle.name(), error = %e, "Broker close failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_client::{EndpointConnector, MockConfig, MockRegistry};
    use observability::RotatingLog;
    use tempfile::tempdir;

    fn monitor(dir: &std::path::Path) -> MonitorSampler {
        MonitorSampler::new(RotatingLog::new(dir.join("queuesize.log"), 1_000_000, 5), 10)
    }

    #[tokio::test]
    async fn test_connect_all() {
        let dir = tempdir().unwrap();
        let connector = EndpointConnector::new();
        let endpoints = BrokerEndpoint::parse_list("mock:a,mock:b").unwrap();

        let pool = BrokerPool::connect(&connector, &endpoints, monitor(dir.path()))
            .await
            .unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.names(), vec!["mock:a", "mock:b"]);
    }

    #[tokio::test]
    async fn test_connect_is_all_or_nothing() {
        let dir = tempdir().unwrap();
        let registry = MockRegistry::new();
        let first = registry.state("a");
        registry.configure(
            "b",
            MockConfig {
                refuse_connect: true,
                ..Default::default()
            },
        );
        let connector = EndpointConnector::with_mocks(registry);
        let endpoints = BrokerEndpoint::parse_list("mock:a,mock:b,mock:c").unwrap();

        let err = BrokerPool::connect(&connector, &endpoints, monitor(dir.path()))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatcherError::Connect { ref endpoint, .. } if endpoint == "mock:b"));
        assert_eq!(err.fatal_kind().exit_code(), 9);
        assert!(first.is_closed());
        assert_eq!(connector.mocks().state("c").connects(), 0);
    }

    #[tokio::test]
    async fn test_drain_all_in_order() {
        let dir = tempdir().unwrap();
        let registry = MockRegistry::new();
        registry.configure("a", MockConfig::holding());
        registry.configure("b", MockConfig::holding());
        let connector = EndpointConnector::with_mocks(registry);
        let endpoints = BrokerEndpoint::parse_list("mock:a,mock:b").unwrap();
        let mut pool = BrokerPool::connect(&connector, &endpoints, monitor(dir.path()))
            .await
            .unwrap();

        pool.publish_attempt(1, "t", 0, &Message::from("b1\n")).await.unwrap();
        pool.publish_attempt(0, "t", 0, &Message::from("a1\n")).await.unwrap();
        pool.publish_attempt(0, "t", 0, &Message::from("a2\n")).await.unwrap();
        assert_eq!(pool.pending_count(0), 2);
        assert_eq!(pool.total_pending(), 3);

        let drained = pool.drain_all().await;
        assert_eq!(
            drained,
            vec![
                (0, Message::from("a1\n")),
                (0, Message::from("a2\n")),
                (1, Message::from("b1\n")),
            ]
        );
        assert_eq!(pool.total_pending(), 0);
    }

    #[test]
    fn test_empty_pool_rejected() {
        let dir = tempdir().unwrap();
        let err = BrokerPool::<broker_client::AnyBroker>::from_handles(Vec::new(), monitor(dir.path()))
            .unwrap_err();
        assert!(matches!(err, DispatcherError::NoBrokers));
    }
}
