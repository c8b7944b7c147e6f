//! Key-set discovery over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use authorizer_sdk::{KeySetError, KeySetFetcher};
use serde_json::Value;

/// Path of the published key set below the issuer URL.
pub const WELL_KNOWN_JWKS_PATH: &str = "/.well-known/jwks.json";

/// Fetches `<issuer>/.well-known/jwks.json`.
#[derive(Debug, Clone)]
pub struct HttpKeySetFetcher {
    client: reqwest::Client,
}

impl HttpKeySetFetcher {
    /// # Errors
    ///
    /// Returns `KeySetError::Transport` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KeySetError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn discovery_url(issuer: &str) -> String {
        format!("{}{WELL_KNOWN_JWKS_PATH}", issuer.trim_end_matches('/'))
    }
}

#[async_trait]
impl KeySetFetcher for HttpKeySetFetcher {
    async fn fetch(&self, issuer: &str) -> Result<Value, KeySetError> {
        let url = Self::discovery_url(issuer);
        let response = self.client.get(&url).send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| KeySetError::InvalidDocument(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> KeySetError {
    if e.is_timeout() {
        KeySetError::Timeout
    } else {
        KeySetError::Transport(e.to_string())
    }
}
