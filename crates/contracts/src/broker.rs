//! Broker client traits - the forwarder's only view of a message broker
//!
//! The wire protocol, connection pooling and leader discovery live behind
//! these traits and are not part of the reliability engine.

use std::future::Future;

use crate::{BrokerEndpoint, ContractError, Message};

/// Connected broker handle
///
/// Owned exclusively by the broker pool for the lifetime of the process.
#[trait_variant::make(BrokerHandle: Send)]
pub trait LocalBrokerHandle {
    /// Display name (used in logs and monitor lines)
    fn name(&self) -> &str;

    /// Hand one message to the client for delivery
    ///
    /// # Errors
    /// Returns a publish error when the client refuses the message.
    async fn publish(
        &mut self,
        topic: &str,
        partition: u32,
        message: &Message,
    ) -> Result<(), ContractError>;

    /// Number of accepted messages not yet delivered
    fn pending_count(&self) -> usize;

    /// Take every pending payload, in delivery order
    ///
    /// Waits until the pending count reaches zero.
    async fn drain_pending(&mut self) -> Result<Vec<Message>, ContractError>;

    /// Release the connection
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Factory that turns an endpoint into a connected handle
pub trait BrokerConnector: Send + Sync {
    /// Handle type produced by this connector
    type Handle: BrokerHandle;

    /// Connect to one endpoint
    fn connect(
        &self,
        endpoint: &BrokerEndpoint,
    ) -> impl Future<Output = Result<Self::Handle, ContractError>> + Send;
}
