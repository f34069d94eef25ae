//! Spool errors

use std::path::PathBuf;

use contracts::FatalKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpoolError {
    /// Spool exists but cannot be read back
    #[error("cannot read spool {path}: {source}")]
    Replay {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Emergency flush could not be written
    #[error("cannot flush spool {path}: {source}")]
    Flush {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Backlog could not be appended at shutdown
    #[error("cannot persist backlog to spool {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Consumed spool could not be removed
    #[error("cannot remove spool {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SpoolError {
    /// Exit class if this error ends the process
    pub fn fatal_kind(&self) -> FatalKind {
        match self {
            Self::Replay { .. } | Self::Remove { .. } => FatalKind::SpoolReplay,
            Self::Flush { .. } => FatalKind::SpoolFlush,
            Self::Persist { .. } => FatalKind::SpoolPersist,
        }
    }
}
