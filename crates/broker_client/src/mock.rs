//! In-memory broker with failure injection
//!
//! Every `mock:<name>` endpoint resolves to a shared [`MockBrokerState`] kept
//! in a [`MockRegistry`], so tests can script failures before connecting and
//! inspect deliveries afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{BrokerHandle, ContractError, Message};
use tracing::{debug, instrument};

use crate::error::BrokerError;

/// Mock broker behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockConfig {
    /// Refuse the initial connection
    pub refuse_connect: bool,
    /// Reject every publish
    pub fail_publish: bool,
    /// Reject this many publishes, then accept
    pub fail_first: u32,
    /// Accept records into the pending queue instead of delivering them
    pub hold_pending: bool,
}

impl MockConfig {
    /// Broker that rejects everything
    pub fn failing() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    /// Broker that accepts but never delivers
    pub fn holding() -> Self {
        Self {
            hold_pending: true,
            ..Self::default()
        }
    }
}

/// One accepted-and-delivered record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub topic: String,
    pub partition: u32,
    pub message: Message,
}

#[derive(Debug, Default)]
struct MockInner {
    config: MockConfig,
    delivered: Vec<Delivery>,
    pending: Vec<Message>,
    attempts: u32,
    connects: u32,
    closed: bool,
}

/// Shared, inspectable state behind one mock broker
#[derive(Debug, Clone, Default)]
pub struct MockBrokerState {
    inner: Arc<Mutex<MockInner>>,
}

impl MockBrokerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MockConfig) -> Self {
        let state = Self::default();
        state.set_config(config);
        state
    }

    fn lock(&self) -> MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the behaviour (takes effect on the next call)
    pub fn set_config(&self, config: MockConfig) {
        self.lock().config = config;
    }

    /// Toggle rejection of every publish
    pub fn set_failing(&self, failing: bool) {
        self.lock().config.fail_publish = failing;
    }

    /// Delivered records, in order
    pub fn delivered(&self) -> Vec<Delivery> {
        self.lock().delivered.clone()
    }

    /// Delivered payloads as text, in order
    pub fn delivered_text(&self) -> Vec<String> {
        self.lock()
            .delivered
            .iter()
            .map(|d| d.message.text().into_owned())
            .collect()
    }

    /// Records accepted but not yet delivered
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Publish calls seen, successful or not
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }

    /// Successful connects
    pub fn connects(&self) -> u32 {
        self.lock().connects
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// Name → state map shared between a connector and its tests
#[derive(Debug, Clone, Default)]
pub struct MockRegistry {
    brokers: Arc<Mutex<HashMap<String, MockBrokerState>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MockBrokerState>> {
        self.brokers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// State for `name`, created with default behaviour if absent
    pub fn state(&self, name: &str) -> MockBrokerState {
        self.lock().entry(name.to_string()).or_default().clone()
    }

    /// Register `name` with `config`, replacing any existing behaviour
    pub fn configure(&self, name: &str, config: MockConfig) -> MockBrokerState {
        let state = self.state(name);
        state.set_config(config);
        state
    }
}

/// Broker handle backed by a [`MockBrokerState`]
#[derive(Debug)]
pub struct MockBroker {
    name: String,
    state: MockBrokerState,
}

impl MockBroker {
    /// Connect to `state`, honouring `refuse_connect`
    pub fn connect(name: impl Into<String>, state: MockBrokerState) -> Result<Self, BrokerError> {
        let name = name.into();
        {
            let mut inner = state.lock();
            if inner.config.refuse_connect {
                return Err(BrokerError::Connect {
                    endpoint: name,
                    source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
                });
            }
            inner.connects += 1;
            inner.closed = false;
        }
        debug!(broker = %name, "Mock broker connected");
        Ok(Self { name, state })
    }

    pub fn state(&self) -> &MockBrokerState {
        &self.state
    }
}

impl BrokerHandle for MockBroker {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "mock_broker_publish",
        skip(self, topic, message),
        fields(broker = %self.name)
    )]
    async fn publish(
        &mut self,
        topic: &str,
        partition: u32,
        message: &Message,
    ) -> Result<(), ContractError> {
        let mut inner = self.state.lock();
        inner.attempts += 1;

        if inner.closed {
            return Err(BrokerError::Closed {
                broker: self.name.clone(),
            }
            .into());
        }
        if inner.config.fail_first > 0 {
            inner.config.fail_first -= 1;
            return Err(BrokerError::rejected(&self.name, "injected failure").into());
        }
        if inner.config.fail_publish {
            return Err(BrokerError::rejected(&self.name, "injected failure").into());
        }

        if inner.config.hold_pending {
            inner.pending.push(message.clone());
        } else {
            inner.delivered.push(Delivery {
                topic: topic.to_string(),
                partition,
                message: message.clone(),
            });
        }
        Ok(())
    }

    fn pending_count(&self) -> usize {
        self.state.pending_len()
    }

    async fn drain_pending(&mut self) -> Result<Vec<Message>, ContractError> {
        Ok(std::mem::take(&mut self.state.lock().pending))
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.state.lock().closed = true;
        Ok(())
    }
}
