//! Configuration for the AWS adapters.

use serde::Deserialize;

/// Configuration.
///
/// Credentials come from the default provider chain (environment, profile,
/// container or instance role).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AwsPluginConfig {
    /// Region of the STS and API Gateway clients. Defaults to the provider
    /// chain's region.
    pub region: Option<String>,

    /// Endpoint override, e.g. for a local emulator.
    pub endpoint_url: Option<String>,
}
