//! Credential exchange via STS `AssumeRole`.

use async_trait::async_trait;
use authorizer_sdk::{BrokerError, CredentialBroker, CredentialExchangeRequest, ScopedCredentials};
use aws_sdk_sts::Client;
use aws_sdk_sts::error::{DisplayErrorContext, SdkError};
use aws_sdk_sts::operation::assume_role::AssumeRoleError;
use aws_sdk_sts::types::Credentials;
use secrecy::SecretString;
use time::OffsetDateTime;

/// Assumes the trust role with the synthesized document as session policy.
///
/// STS intersects the role's permissions with the session policy, so the
/// issued credentials can never exceed either.
#[derive(Debug, Clone)]
pub struct StsCredentialBroker {
    client: Client,
}

impl StsCredentialBroker {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CredentialBroker for StsCredentialBroker {
    async fn exchange(
        &self,
        request: &CredentialExchangeRequest,
    ) -> Result<ScopedCredentials, BrokerError> {
        let policy = request
            .policy
            .to_json()
            .map_err(|e| BrokerError::InvalidPolicy(e.to_string()))?;
        let duration = i32::try_from(request.duration_secs).map_err(|_| {
            BrokerError::InvalidPolicy(format!("duration {}s", request.duration_secs))
        })?;

        let output = self
            .client
            .assume_role()
            .role_arn(&request.trust_role)
            .role_session_name(&request.session_label)
            .policy(policy)
            .duration_seconds(duration)
            .send()
            .await
            .map_err(classify)?;

        let credentials = output.credentials().ok_or_else(|| {
            BrokerError::MalformedResponse("AssumeRole returned no credentials".to_owned())
        })?;
        tracing::debug!(
            session = %request.session_label,
            access_key_id = credentials.access_key_id(),
            "assumed trust role"
        );
        scoped(credentials)
    }
}

fn scoped(credentials: &Credentials) -> Result<ScopedCredentials, BrokerError> {
    let expiration = OffsetDateTime::from_unix_timestamp(credentials.expiration().secs())
        .map_err(|e| BrokerError::MalformedResponse(format!("credential expiration: {e}")))?;
    Ok(ScopedCredentials {
        access_key_id: credentials.access_key_id().to_owned(),
        secret_access_key: SecretString::from(credentials.secret_access_key().to_owned()),
        session_token: SecretString::from(credentials.session_token().to_owned()),
        expiration,
    })
}

fn classify(err: SdkError<AssumeRoleError>) -> BrokerError {
    let message = DisplayErrorContext(&err).to_string();
    match err.as_service_error() {
        Some(e)
            if e.is_malformed_policy_document_exception()
                || e.is_packed_policy_too_large_exception() =>
        {
            BrokerError::InvalidPolicy(message)
        }
        Some(_) => BrokerError::Rejected(message),
        None => BrokerError::Unavailable(message),
    }
}
