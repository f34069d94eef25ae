//! # Spool
//!
//! Where undelivered messages wait.
//!
//! - [`SpoolStore`]: flat file that survives restarts; replayed before live
//!   input and rewritten on the all-brokers-down path
//! - [`InputQueue`]: bounded memory queue between the input reader and the
//!   dispatcher, with backpressure on the reader
//! - [`RecordReader`]: `\n` framing with the record length bound

pub mod buffer;
pub mod error;
pub mod record;
pub mod store;

pub use buffer::{InputBuffer, InputQueue};
pub use error::SpoolError;
pub use record::{split_records, RecordReader};
pub use store::SpoolStore;
