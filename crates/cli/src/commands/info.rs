//! `info` command implementation.

use contracts::{BrokerEndpoint, ForwarderConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::{CliError, Result};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    source: String,
    config: ForwarderConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
struct EndpointInfo {
    name: String,
    kind: &'static str,
}

impl From<&BrokerEndpoint> for EndpointInfo {
    fn from(endpoint: &BrokerEndpoint) -> Self {
        let kind = match endpoint {
            BrokerEndpoint::Tcp { .. } => "tcp",
            BrokerEndpoint::File(_) => "file",
            BrokerEndpoint::Mock(_) => "mock",
        };
        Self {
            name: endpoint.name(),
            kind,
        }
    }
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let (config, source) = args.config.resolve()?;
    info!(source = %source, "Loaded configuration info");

    let endpoints = if args.endpoints {
        config.endpoints()?.iter().map(EndpointInfo::from).collect()
    } else {
        Vec::new()
    };

    if args.json {
        let info = ConfigInfo {
            source: source.to_string(),
            config,
            endpoints,
        };
        let json = serde_json::to_string_pretty(&info)
            .map_err(|e| CliError::Output(e.to_string()))?;
        println!("{}", json);
    } else {
        let toml = config_loader::ConfigLoader::to_toml(&config)?;
        println!("# Effective configuration ({})", source);
        print!("{}", toml);
        if !endpoints.is_empty() {
            println!("\n# Endpoints");
            for endpoint in &endpoints {
                println!("#   {} ({})", endpoint.name, endpoint.kind);
            }
        }
    }

    Ok(())
}
