//! Forwarder orchestrator - builds the broker pool, dispatcher and engine
//! from a [`ForwarderConfig`] and runs them over one input stream.

use broker_client::EndpointConnector;
use contracts::{BrokerConnector, ForwarderConfig};
use dispatcher::{BrokerPool, DispatchSettings, Dispatcher, Engine, EngineSettings, RunReport, ShutdownFlag};
use observability::{MonitorSampler, RotatingLog};
use spool::SpoolStore;
use tokio::io::AsyncRead;
use tracing::{info, instrument};

use crate::error::{CliError, Result};

/// One configured forwarder run
pub struct Forwarder<C = EndpointConnector> {
    config: ForwarderConfig,
    connector: C,
    shutdown: ShutdownFlag,
}

impl Forwarder {
    /// Forwarder over real endpoints
    pub fn new(config: ForwarderConfig, shutdown: ShutdownFlag) -> Self {
        Self::with_connector(config, EndpointConnector::new(), shutdown)
    }
}

impl<C: BrokerConnector> Forwarder<C> {
    pub fn with_connector(config: ForwarderConfig, connector: C, shutdown: ShutdownFlag) -> Self {
        Self {
            config,
            connector,
            shutdown,
        }
    }

    /// Monitor sampler over the configured queue-depth log
    ///
    /// The log is opened once up front so an unwritable path fails before
    /// any broker is connected.
    fn monitor(&self) -> Result<MonitorSampler> {
        let log = RotatingLog::new(
            &self.config.monitor_log_path,
            self.config.max_log_size,
            self.config.max_log_backups,
        );
        log.ensure_writable().map_err(CliError::MonitorLog)?;
        Ok(MonitorSampler::new(log, self.config.monitor_period_secs))
    }

    /// Connect, replay the spool, forward `input` until it ends or shutdown
    /// is requested, then persist what is left
    #[instrument(
        name = "forwarder_run",
        skip_all,
        fields(topic = %self.config.topic, brokers = %self.config.brokers)
    )]
    pub async fn run<R>(self, input: R) -> Result<RunReport>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let monitor = self.monitor()?;
        let endpoints = self.config.endpoints()?;

        let pool = BrokerPool::connect(&self.connector, &endpoints, monitor).await?;
        info!(brokers = ?pool.names(), "Broker pool ready");

        let spool = SpoolStore::new(&self.config.spool_path);
        let dispatcher = Dispatcher::new(pool, spool, DispatchSettings::from_config(&self.config));
        let engine = Engine::new(dispatcher, self.shutdown, EngineSettings::from_config(&self.config));

        Ok(engine.run(input).await?)
    }
}
