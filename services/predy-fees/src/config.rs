//! Service configuration
//!
//! Layers, lowest priority first: built-in defaults, an optional
//! `predy-fees.toml` in the working directory, then `PREDY_FEES_*`
//! environment variables. Nested keys use `__` (e.g. `PREDY_FEES_PORT`,
//! `PREDY_FEES_ORACLE__BASE_URL`).

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::normalizers::ProtocolVersion;

const DEFAULTS: &str = r#"
port = 8080
controller_address = "0x68a154fb3e8ff6e4da10ecd54def25d9149ddbde"

[oracle]
base_url = "https://coins.llama.fi"
timeout_secs = 30

[subgraph]
timeout_secs = 30

[[deployments]]
version = "v3"
chain = "arbitrum"
endpoint = "https://api.thegraph.com/subgraphs/name/predy-dev/predyv3arbitrum"
start = 1671092333

[[deployments]]
version = "v320"
chain = "arbitrum"
endpoint = "https://api.thegraph.com/subgraphs/name/predy-dev/predy-v320-arbitrum"
start = 1678734774
"#;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub port: u16,
    /// Predy controller; prefixes v3.2 entity ids
    pub controller_address: String,
    pub oracle: OracleSettings,
    pub subgraph: SubgraphSettings,
    pub deployments: Vec<Deployment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphSettings {
    pub timeout_secs: u64,
}

/// One subgraph deployment bound to a protocol version and chain
#[derive(Debug, Clone, Deserialize)]
pub struct Deployment {
    pub version: ProtocolVersion,
    pub chain: String,
    pub endpoint: String,
    pub start: i64,
}

impl OracleSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SubgraphSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    /// Load from defaults, `predy-fees.toml` and the environment
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS, config::FileFormat::Toml))
            .add_source(config::File::with_name("predy-fees").required(false))
            .add_source(
                config::Environment::with_prefix("PREDY_FEES")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let settings: Settings = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    /// Defaults overlaid with a TOML document
    pub fn from_toml(overlay: &str) -> anyhow::Result<Self> {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(DEFAULTS, config::FileFormat::Toml))
            .add_source(config::File::from_str(overlay, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let addr = &self.controller_address;
        if addr.len() != 42
            || !addr.starts_with("0x")
            || !addr[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            bail!("controller_address is not a 20-byte hex address: {}", addr);
        }

        url::Url::parse(&self.oracle.base_url)
            .with_context(|| format!("Invalid oracle base_url: {}", self.oracle.base_url))?;

        if self.deployments.is_empty() {
            bail!("No deployments configured");
        }

        let mut seen = HashSet::new();
        for d in &self.deployments {
            url::Url::parse(&d.endpoint)
                .with_context(|| format!("Invalid endpoint for {}: {}", d.version.label(), d.endpoint))?;
            if d.start < 0 {
                bail!("Negative start for {} {}", d.version.label(), d.chain);
            }
            if !seen.insert((d.version, d.chain.to_lowercase())) {
                bail!("Duplicate deployment {} {}", d.version.label(), d.chain);
            }
        }

        Ok(())
    }
}
