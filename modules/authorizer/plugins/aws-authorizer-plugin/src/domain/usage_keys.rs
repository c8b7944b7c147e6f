//! Usage-plan key lookup via API Gateway `GetApiKeys`.

use async_trait::async_trait;
use authorizer_sdk::{TierKeyError, TierKeyResolver};
use aws_sdk_apigateway::Client;
use aws_sdk_apigateway::error::DisplayErrorContext;
use aws_sdk_apigateway::types::ApiKey;

/// Name of the API key of `tier`.
#[must_use]
pub fn tier_key_name(tier: &str) -> String {
    format!("{tier}Key")
}

#[derive(Debug, Clone)]
pub struct ApiGatewayTierKeys {
    client: Client,
}

impl ApiGatewayTierKeys {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TierKeyResolver for ApiGatewayTierKeys {
    async fn tier_key(&self, tier: &str) -> Result<String, TierKeyError> {
        let name = tier_key_name(tier);
        let output = self
            .client
            .get_api_keys()
            .name_query(&name)
            .include_values(true)
            .send()
            .await
            .map_err(|e| TierKeyError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        pick_key(output.items(), &name).ok_or_else(|| TierKeyError::NotFound {
            tier: tier.to_owned(),
        })
    }
}

/// `GetApiKeys` matches names by prefix; prefer the exact name, else the
/// first key with a value.
fn pick_key(items: &[ApiKey], name: &str) -> Option<String> {
    items
        .iter()
        .find(|key| key.name() == Some(name) && key.value().is_some())
        .or_else(|| items.iter().find(|key| key.value().is_some()))
        .and_then(ApiKey::value)
        .map(str::to_owned)
}
