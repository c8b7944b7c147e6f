//! Collaborator traits the authorizer consumes.
//!
//! Vendor adapters (HTTP key-set discovery, the trust-delegation service,
//! the usage-plan service) implement these traits and are injected into the
//! authorizer at construction. Implementations must not retry: one failed
//! call is one failed request.

use async_trait::async_trait;
use serde_json::Value;

use crate::credentials::{CredentialExchangeRequest, ScopedCredentials};
use crate::error::{AccountError, BrokerError, KeySetError, TierKeyError};

/// Fetches the published key set of a token issuer.
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// Fetch the raw key-set document (`{"keys": [...]}`) for `issuer`.
    ///
    /// # Errors
    ///
    /// - `Timeout` / `Transport` when the discovery endpoint is unreachable
    /// - `Status` for non-success HTTP responses
    /// - `InvalidDocument` when the body is not JSON
    async fn fetch(&self, issuer: &str) -> Result<Value, KeySetError>;
}

/// Exchanges a session policy for time-boxed scoped credentials.
///
/// The policy is presented as a session policy: effective permissions are
/// the intersection of the trust role and the policy, never more.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    /// Perform exactly one exchange.
    ///
    /// # Errors
    ///
    /// Any failure of the delegation protocol; the caller denies the request.
    async fn exchange(
        &self,
        request: &CredentialExchangeRequest,
    ) -> Result<ScopedCredentials, BrokerError>;
}

/// Resolves the account that owns the shared data store.
#[async_trait]
pub trait AccountResolver: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AccountError`] when the identity service fails or returns no
    /// account.
    async fn account_id(&self) -> Result<String, AccountError>;
}

/// Looks up the usage-plan key of a tier.
#[async_trait]
pub trait TierKeyResolver: Send + Sync {
    /// Value of the key named `<tier>Key`.
    ///
    /// # Errors
    ///
    /// Returns [`TierKeyError`] on a miss or service failure. Callers treat
    /// this as non-fatal.
    async fn tier_key(&self, tier: &str) -> Result<String, TierKeyError>;
}
