//! AWS adapters.

pub mod account;
pub mod credentials;
pub mod usage_keys;

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};

pub use account::StsAccountResolver;
pub use credentials::StsCredentialBroker;
pub use usage_keys::ApiGatewayTierKeys;

use crate::config::AwsPluginConfig;

/// All AWS adapters, sharing one SDK configuration.
pub struct AwsAdapters {
    pub broker: Arc<StsCredentialBroker>,
    pub accounts: Arc<StsAccountResolver>,
    pub tier_keys: Arc<ApiGatewayTierKeys>,
}

impl AwsAdapters {
    /// Resolve the SDK configuration and build the clients.
    pub async fn load(cfg: &AwsPluginConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &cfg.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;
        tracing::debug!(region = ?shared.region(), "aws configuration loaded");

        let sts = aws_sdk_sts::Client::new(&shared);
        Self {
            broker: Arc::new(StsCredentialBroker::new(sts.clone())),
            accounts: Arc::new(StsAccountResolver::new(sts)),
            tier_keys: Arc::new(ApiGatewayTierKeys::new(aws_sdk_apigateway::Client::new(&shared))),
        }
    }
}
