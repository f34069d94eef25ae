//! # Contracts
//!
//! Frozen interface contracts shared by every forwarder crate: the message
//! model, broker endpoint addressing, the broker client traits, the forwarder
//! configuration and the fatal exit-status table.
//! Business crates depend on this crate, never the other way around.
//!
//! ## Record model
//! - A `Message` is one input line including its trailing `\n`
//! - Messages carry no identity; duplicates are indistinguishable

mod broker;
mod config;
mod endpoint;
mod error;
mod exit;
mod message;

pub use broker::{BrokerConnector, BrokerHandle, LocalBrokerHandle};
pub use config::*;
pub use endpoint::{BrokerEndpoint, DEFAULT_BROKER_PORT};
pub use error::*;
pub use exit::FatalKind;
pub use message::{Message, DELIMITER, MAX_RECORD_LEN};
