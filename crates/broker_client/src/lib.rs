//! # Broker Client
//!
//! Broker adapters behind the `BrokerHandle` contract.
//!
//! | endpoint        | adapter      |
//! |-----------------|--------------|
//! | `host[:port]`   | [`TcpBroker`]  |
//! | `file:<path>`   | [`FileBroker`] |
//! | `mock:<name>`   | [`MockBroker`] |
//!
//! [`EndpointConnector`] picks the adapter; [`AnyBroker`] lets one pool hold
//! a mix of them.

pub mod connector;
pub mod error;
pub mod file;
pub mod mock;
pub mod tcp;

pub use connector::{AnyBroker, EndpointConnector};
pub use error::BrokerError;
pub use file::FileBroker;
pub use mock::{Delivery, MockBroker, MockBrokerState, MockConfig, MockRegistry};
pub use tcp::{TcpBroker, TcpBrokerConfig, DEFAULT_MAX_PENDING};
