//! Fatal exit statuses
//!
//! One small integer per failure class so supervisors can tell them apart.

use std::fmt;

/// Classes of non-recoverable failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FatalKind {
    /// Configuration missing, unreadable or invalid
    Config,
    /// Command-line usage error
    Usage,
    /// Monitor log cannot be opened
    MonitorLogOpen,
    /// Error log cannot be opened
    ErrorLogOpen,
    /// Spool cannot be written while persisting the broker backlog
    SpoolPersist,
    /// Spool cannot be written during the emergency flush
    SpoolFlush,
    /// Every broker failed for one message, repeatedly
    AllBrokersDown,
    /// Spool exists but cannot be read during replay
    SpoolReplay,
    /// A configured broker could not be connected at startup
    BrokerConnect,
}

impl FatalKind {
    /// Process exit code for this class
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Config => 1,
            Self::Usage => 2,
            Self::MonitorLogOpen => 3,
            Self::ErrorLogOpen => 4,
            Self::SpoolPersist => 5,
            Self::SpoolFlush => 6,
            Self::AllBrokersDown => 7,
            Self::SpoolReplay => 8,
            Self::BrokerConnect => 9,
        }
    }
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Usage => "usage",
            Self::MonitorLogOpen => "monitor_log_open",
            Self::ErrorLogOpen => "error_log_open",
            Self::SpoolPersist => "spool_persist",
            Self::SpoolFlush => "spool_flush",
            Self::AllBrokersDown => "all_brokers_down",
            Self::SpoolReplay => "spool_replay",
            Self::BrokerConnect => "broker_connect",
        };
        f.write_str(s)
    }
}
