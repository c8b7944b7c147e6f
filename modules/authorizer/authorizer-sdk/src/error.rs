//! Error types for the authorizer.

use thiserror::Error;

/// How an [`AuthorizerError`] should be treated operationally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The caller's credentials were rejected. Expected, per request.
    Rejected,
    /// The authorizer's own configuration is broken. Alert operators.
    Configuration,
    /// A collaborator (key set host, identity service, credential service)
    /// failed or timed out.
    Dependency,
    /// A best-effort step failed; the request still proceeds.
    Degraded,
}

/// Failure taxonomy of one authorization.
///
/// Every variant except [`AuthorizerError::TierKeyLookupFailed`] turns the
/// decision into a deny. Messages never carry secret material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizerError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("untrusted issuer: {0}")]
    UntrustedIssuer(String),

    #[error("token expired")]
    TokenExpired,

    #[error("key set fetch failed: {0}")]
    KeySetFetchFailed(String),

    #[error("unmapped region alias '{0}'")]
    UnmappedRegionAlias(String),

    #[error("account resolution failed: {0}")]
    AccountResolutionFailed(String),

    #[error("no applicable policy for role '{role}'")]
    NoApplicablePolicy { role: String },

    #[error("credential exchange failed: {0}")]
    CredentialExchangeFailed(String),

    #[error("tier key lookup failed: {0}")]
    TierKeyLookupFailed(String),

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl AuthorizerError {
    /// Stable machine-readable code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedToken(_) => "malformed_token",
            Self::InvalidSignature(_) => "invalid_signature",
            Self::UntrustedIssuer(_) => "untrusted_issuer",
            Self::TokenExpired => "token_expired",
            Self::KeySetFetchFailed(_) => "key_set_fetch_failed",
            Self::UnmappedRegionAlias(_) => "unmapped_region_alias",
            Self::AccountResolutionFailed(_) => "account_resolution_failed",
            Self::NoApplicablePolicy { .. } => "no_applicable_policy",
            Self::CredentialExchangeFailed(_) => "credential_exchange_failed",
            Self::TierKeyLookupFailed(_) => "tier_key_lookup_failed",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }

    #[must_use]
    pub fn class(&self) -> FailureClass {
        match self {
            Self::MalformedToken(_)
            | Self::InvalidSignature(_)
            | Self::UntrustedIssuer(_)
            | Self::TokenExpired
            | Self::NoApplicablePolicy { .. } => FailureClass::Rejected,
            Self::UnmappedRegionAlias(_) => FailureClass::Configuration,
            Self::KeySetFetchFailed(_)
            | Self::AccountResolutionFailed(_)
            | Self::CredentialExchangeFailed(_)
            | Self::DeadlineExceeded => FailureClass::Dependency,
            Self::TierKeyLookupFailed(_) => FailureClass::Degraded,
        }
    }

    /// Whether this failure turns the decision into a deny.
    #[must_use]
    pub fn denies_request(&self) -> bool {
        self.class() != FailureClass::Degraded
    }
}

/// Key-set discovery failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeySetError {
    #[error("key set fetch timed out")]
    Timeout,

    #[error("key set endpoint unreachable: {0}")]
    Transport(String),

    #[error("key set endpoint returned status {0}")]
    Status(u16),

    #[error("key set document is invalid: {0}")]
    InvalidDocument(String),
}

/// Trust-delegation exchange failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrokerError {
    #[error("trust relationship rejected: {0}")]
    Rejected(String),

    #[error("session policy rejected: {0}")]
    InvalidPolicy(String),

    #[error("credential service unavailable: {0}")]
    Unavailable(String),

    #[error("credential exchange timed out")]
    Timeout,

    #[error("credential service returned an incomplete response: {0}")]
    MalformedResponse(String),
}

/// Account identity lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("identity service unavailable: {0}")]
    Unavailable(String),

    #[error("account lookup timed out")]
    Timeout,

    #[error("identity service returned no account")]
    Missing,
}

/// Usage-tier key lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierKeyError {
    #[error("no usage key found for tier '{tier}'")]
    NotFound { tier: String },

    #[error("usage key service unavailable: {0}")]
    Unavailable(String),

    #[error("usage key lookup timed out")]
    Timeout,
}

impl From<KeySetError> for AuthorizerError {
    fn from(e: KeySetError) -> Self {
        Self::KeySetFetchFailed(e.to_string())
    }
}

impl From<BrokerError> for AuthorizerError {
    fn from(e: BrokerError) -> Self {
        Self::CredentialExchangeFailed(e.to_string())
    }
}

impl From<AccountError> for AuthorizerError {
    fn from(e: AccountError) -> Self {
        Self::AccountResolutionFailed(e.to_string())
    }
}

impl From<TierKeyError> for AuthorizerError {
    fn from(e: TierKeyError) -> Self {
        Self::TierKeyLookupFailed(e.to_string())
    }
}
