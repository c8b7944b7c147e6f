//! Account identity via STS `GetCallerIdentity`.

use async_trait::async_trait;
use authorizer_sdk::{AccountError, AccountResolver};
use aws_sdk_sts::Client;
use aws_sdk_sts::error::DisplayErrorContext;

#[derive(Debug, Clone)]
pub struct StsAccountResolver {
    client: Client,
}

impl StsAccountResolver {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AccountResolver for StsAccountResolver {
    async fn account_id(&self) -> Result<String, AccountError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| AccountError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        output
            .account()
            .filter(|account| !account.is_empty())
            .map(str::to_owned)
            .ok_or(AccountError::Missing)
    }
}
