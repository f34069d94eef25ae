//! Rotating log error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the rotating log files
#[derive(Debug, Error)]
pub enum LogError {
    /// Active file cannot be opened for append
    #[error("cannot open log '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rename or delete during rotation failed
    #[error("cannot rotate log '{}': {source}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Append failed
    #[error("cannot write log '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
