//! Scoped credentials and the exchange request that produces them.

use secrecy::SecretString;
use time::OffsetDateTime;

use crate::policy::AccessPolicyDocument;

/// Short-lived credentials whose permissions are the intersection of the
/// trust role and the session policy they were issued under.
///
/// Owned by one request and never persisted. The secret and session token
/// are `SecretString`, so `Debug` output redacts them.
#[derive(Debug, Clone)]
pub struct ScopedCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: SecretString,
    pub expiration: OffsetDateTime,
}

/// Input of a single trust-delegation exchange.
#[derive(Debug, Clone)]
pub struct CredentialExchangeRequest {
    /// Identifier of the trust role to assume.
    pub trust_role: String,
    /// Audit correlation label (`<tenantId>-<requestId>`, sanitised).
    pub session_label: String,
    /// Session policy narrowing the trust role's permissions.
    pub policy: AccessPolicyDocument,
    /// Requested validity window in seconds.
    pub duration_secs: u32,
}
