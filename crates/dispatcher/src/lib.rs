//! # Dispatcher
//!
//! Reliable delivery core of the forwarder.
//!
//! Responsibilities:
//! - Hold the connected brokers and sample their queue depths (`BrokerPool`)
//! - Fail over across brokers with random start and partition, retry whole
//!   cycles, flush to the spool when every broker stays down (`Dispatcher`)
//! - Replay the spool, forward live input, save the backlog on shutdown
//!   (`Engine`)

pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod pool;
pub mod retry;
pub mod shutdown;

pub use dispatcher::{DispatchSettings, Dispatcher, Published};
pub use engine::{Engine, EngineSettings, RunReport};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pool::BrokerPool;
pub use retry::RetryState;
pub use shutdown::ShutdownFlag;
