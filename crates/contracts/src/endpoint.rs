//! BrokerEndpoint - parsed entry of the comma-separated broker list

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ContractError;

/// Port used when an endpoint omits `:port`
pub const DEFAULT_BROKER_PORT: u16 = 9092;

/// One broker address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BrokerEndpoint {
    /// `host[:port]`
    Tcp { host: String, port: u16 },
    /// `file:<path>` - append payloads to a local file
    File(PathBuf),
    /// `mock:<name>` - in-memory broker
    Mock(String),
}

impl BrokerEndpoint {
    /// Parse a comma-separated endpoint list
    ///
    /// Empty entries (e.g. a trailing comma) are skipped; an empty list is an
    /// error.
    pub fn parse_list(list: &str) -> Result<Vec<Self>, ContractError> {
        let endpoints = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Self>, _>>()?;

        if endpoints.is_empty() {
            return Err(ContractError::invalid_endpoint(list, "no brokers configured"));
        }
        Ok(endpoints)
    }

    /// Display name used in logs and monitor lines
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl FromStr for BrokerEndpoint {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(ContractError::invalid_endpoint(s, "empty file path"));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        if let Some(name) = s.strip_prefix("mock:") {
            if name.is_empty() {
                return Err(ContractError::invalid_endpoint(s, "empty mock name"));
            }
            return Ok(Self::Mock(name.to_string()));
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| ContractError::invalid_endpoint(s, format!("bad port: {e}")))?;
                (host, port)
            }
            None => (s, DEFAULT_BROKER_PORT),
        };

        if host.is_empty() {
            return Err(ContractError::invalid_endpoint(s, "empty host"));
        }

        Ok(Self::Tcp {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "{host}:{port}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Mock(name) => write!(f, "mock:{name}"),
        }
    }
}
