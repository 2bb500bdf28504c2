//! Layered server configuration: defaults, YAML file, `IDGW__*` environment, CLI.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use identity_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// Environment prefix; `__` separates nested keys (`IDGW__GATEWAY__TRANSPORT=http`).
pub const ENV_PREFIX: &str = "IDGW__";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
        }
    }
}

impl AppConfig {
    /// Load defaults, then the YAML file (if any), then `IDGW__*` variables.
    ///
    /// # Errors
    /// A missing or malformed YAML file, unknown keys, or values of the wrong type.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")
    }

    pub fn apply_cli_overrides(&mut self, port: Option<u16>) {
        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
        }
    }

    /// # Errors
    /// Serialization failure.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration as YAML")
    }
}
