//! Dispatcher - failover publish with retry and emergency spool flush

use std::sync::Arc;
use std::time::Duration;

use contracts::{BrokerHandle, ForwarderConfig, Message};
use observability::{DeliveryMetricsAggregator, DeliverySummary, LogError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spool::SpoolStore;
use tracing::{debug, error, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::pool::BrokerPool;
use crate::retry::RetryState;

/// Publish parameters
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub topic: String,
    pub partitions: u32,
    /// Pause after a cycle in which every broker failed
    pub retry_backoff: Duration,
    /// Consecutive failed cycles before the message is spooled and the run ends
    pub max_failure_cycles: u32,
}

impl DispatchSettings {
    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self {
            topic: config.topic.clone(),
            partitions: config.partitions,
            retry_backoff: config.retry_backoff(),
            max_failure_cycles: config.max_failure_cycles,
        }
    }
}

/// Outcome of one successful [`Dispatcher::try_publish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Published {
    /// Broker that took the message
    pub broker: usize,
    pub partition: u32,
    /// Attempts in this cycle, including the successful one
    pub attempts: u32,
}

/// Failover dispatcher over a [`BrokerPool`]
#[derive(Debug)]
pub struct Dispatcher<H> {
    pool: BrokerPool<H>,
    spool: SpoolStore,
    settings: DispatchSettings,
    rng: StdRng,
    metrics: Arc<DispatchMetrics>,
    stats: DeliveryMetricsAggregator,
}

impl<H: BrokerHandle> Dispatcher<H> {
    pub fn new(pool: BrokerPool<H>, spool: SpoolStore, settings: DispatchSettings) -> Self {
        Self::with_rng(pool, spool, settings, StdRng::from_os_rng())
    }

    /// Dispatcher with a caller-supplied random source
    pub fn with_rng(
        pool: BrokerPool<H>,
        spool: SpoolStore,
        settings: DispatchSettings,
        rng: StdRng,
    ) -> Self {
        Self {
            pool,
            spool,
            settings,
            rng,
            metrics: Arc::new(DispatchMetrics::new()),
            stats: DeliveryMetricsAggregator::new(),
        }
    }

    pub fn pool(&self) -> &BrokerPool<H> {
        &self.pool
    }

    pub fn spool(&self) -> &SpoolStore {
        &self.spool
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    /// Shared counters
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Per-message and per-broker delivery statistics
    pub fn summary(&self) -> DeliverySummary {
        self.stats.summary()
    }

    /// One failover cycle: try each broker once, from a random start
    ///
    /// Each attempt picks its own random partition. Returns `None` when every
    /// broker failed.
    pub async fn try_publish(&mut self, message: &Message) -> Option<Published> {
        let count = self.pool.len();
        let start = self.rng.random_range(0..count);

        for offset in 0..count {
            let index = (start + offset) % count;
            let partition = self.rng.random_range(0..self.settings.partitions.max(1));
            let attempts = offset as u32 + 1;

            match self
                .pool
                .publish_attempt(index, &self.settings.topic, partition, message)
                .await
            {
                Ok(()) => {
                    observability::record_publish_attempt(self.pool.name(index), true);
                    debug!(broker = %self.pool.name(index), partition, attempts, "Published");
                    return Some(Published {
                        broker: index,
                        partition,
                        attempts,
                    });
                }
                Err(e) => {
                    let broker = self.pool.name(index);
                    observability::record_publish_attempt(broker, false);
                    self.metrics.inc_failed_attempts();
                    self.stats.record_failure(broker);
                    warn!(
                        broker = %broker,
                        partition,
                        error = %e,
                        payload = %message.text().trim_end(),
                        "Publish failed"
                    );
                }
            }
        }

        None
    }

    /// Publish `message`, retrying whole cycles until it is taken
    ///
    /// After `max_failure_cycles` consecutive failed cycles the message and
    /// every broker's backlog are flushed to the spool and
    /// [`DispatcherError::AllBrokersDown`] is returned. A monitor log failure
    /// flushes the same way before returning [`DispatcherError::Monitor`].
    #[instrument(name = "dispatcher_produce", skip(self, message), fields(len = message.len()))]
    pub async fn produce_with_retry(&mut self, message: Message) -> Result<Published, DispatcherError> {
        let mut retry = RetryState::new(self.settings.max_failure_cycles);

        loop {
            let outcome = self.try_publish(&message).await;

            match &outcome {
                Some(published) => {
                    retry.record_attempts(published.attempts);
                    self.metrics.inc_published();
                    self.stats.record_delivery(retry.attempts());
                    observability::record_message_published(retry.attempts());
                }
                None => {
                    retry.record_attempts(self.pool.len() as u32);
                    self.metrics.inc_retry_cycles();
                    self.stats.record_cycle();
                    observability::record_retry_cycle();
                }
            }

            if let Err(e) = self.pool.sample_monitor() {
                let in_flight = outcome.is_none().then_some(message);
                return Err(self.monitor_failure(e, in_flight).await);
            }

            if let Some(published) = outcome {
                return Ok(published);
            }

            tokio::time::sleep(self.settings.retry_backoff).await;

            if retry.record_cycle() {
                return Err(self.fatal_flush(message, retry.cycles()).await);
            }

            debug!(cycle = retry.cycles(), "All brokers failed, retrying");
        }
    }

    /// Spool the message plus every broker's backlog, then report the outage
    async fn fatal_flush(&mut self, message: Message, cycles: u32) -> DispatcherError {
        error!(topic = %self.settings.topic, cycles, "all broker(s) down");

        if let Err(e) = self.emergency_flush(Some(message)).await {
            return e;
        }

        DispatcherError::AllBrokersDown {
            topic: self.settings.topic.clone(),
            cycles,
        }
    }

    /// Spool what is undelivered, then report the monitor log failure
    async fn monitor_failure(&mut self, error: LogError, in_flight: Option<Message>) -> DispatcherError {
        error!(error = %error, "Monitor log write failed");

        if let Err(e) = self.emergency_flush(in_flight).await {
            return e;
        }

        DispatcherError::Monitor(error)
    }

    /// Replace the spool with `in_flight` followed by every broker's backlog
    ///
    /// With nothing to keep the spool is removed. Returns the records written.
    async fn emergency_flush(&mut self, in_flight: Option<Message>) -> Result<usize, DispatcherError> {
        let mut records: Vec<Message> = in_flight.into_iter().collect();
        records.extend(self.pool.drain_all().await.into_iter().map(|(_, m)| m));

        match records.split_first() {
            Some((first, rest)) => self.spool.flush(first, rest)?,
            None => {
                self.spool.remove()?;
            }
        }

        self.metrics.add_spooled(records.len() as u64);
        observability::record_messages_spooled(records.len());
        Ok(records.len())
    }

    /// Append `extra` after the flushed message in the spool
    ///
    /// Used when more undelivered input remains behind an emergency flush.
    pub fn spool_remaining(&self, extra: &[Message]) -> Result<usize, DispatcherError> {
        let written = self.spool.persist_backlog(extra)?;
        self.metrics.add_spooled(written as u64);
        observability::record_messages_spooled(written);
        Ok(written)
    }

    /// Normal shutdown: drain the brokers, append their backlog and
    /// `leftover` input to the spool, close the pool
    ///
    /// Returns the number of records spooled.
    #[instrument(name = "dispatcher_shutdown", skip(self, leftover), fields(leftover = leftover.len()))]
    pub async fn shutdown(&mut self, leftover: Vec<Message>) -> Result<usize, DispatcherError> {
        let mut records: Vec<Message> = self
            .pool
            .drain_all()
            .await
            .into_iter()
            .map(|(_, m)| m)
            .collect();
        records.extend(leftover);

        let result = self.spool_remaining(&records);
        self.pool.close_all().await;

        let written = result?;
        if written > 0 {
            info!(records = written, path = %self.spool.path().display(), "Backlog saved for next start");
        }
        Ok(written)
    }
}
