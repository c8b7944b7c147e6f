//! Server configuration: a YAML file layered under `AUTHORIZER__` environment
//! variables.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, bail};
use authorizer::AuthorizerConfig;
use aws_authorizer_plugin::AwsPluginConfig;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

/// Prefix of environment overrides, e.g.
/// `AUTHORIZER__AUTHORIZER__ACCOUNT_ID=111122223333`.
pub const ENV_PREFIX: &str = "AUTHORIZER__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub server: HttpConfig,
    pub authorizer: AuthorizerConfig,
    pub aws: AwsPluginConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

impl ServerConfig {
    /// Load from an optional YAML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or any layer fails to parse.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file {} not found", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }
}
