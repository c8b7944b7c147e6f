//! Bearer token verification.
//!
//! The token is pre-parsed without trusting its signature only to learn the
//! issuer and key id, which select the key set. Nothing from the pre-parse is
//! used for authorization: claims come from the signature-verified payload.

use std::sync::Arc;

use authorizer_sdk::{AuthorizerError, IdentityClaims};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::Value;
use time::OffsetDateTime;

use super::key_set::KeySetCache;
use crate::config::AuthorizerConfig;

pub struct TokenVerifier {
    key_sets: Arc<KeySetCache>,
    trusted_issuers: Vec<String>,
    audiences: Vec<String>,
    algorithms: Vec<Algorithm>,
}

impl TokenVerifier {
    #[must_use]
    pub fn new(key_sets: Arc<KeySetCache>, cfg: &AuthorizerConfig) -> Self {
        Self {
            key_sets,
            trusted_issuers: cfg
                .trusted_issuers
                .iter()
                .filter(|issuer| !issuer.trim().is_empty())
                .cloned()
                .collect(),
            audiences: cfg
                .audiences
                .iter()
                .filter(|aud| !aud.trim().is_empty())
                .cloned()
                .collect(),
            algorithms: cfg
                .allowed_algorithms
                .iter()
                .filter_map(|alg| alg.parse().ok())
                .collect(),
        }
    }

    /// Verify `token` and return its identity claims.
    ///
    /// Structural problems are reported before any network call; an issuer
    /// outside the allow-list never causes a key-set fetch.
    ///
    /// # Errors
    ///
    /// - `MalformedToken` for unparsable tokens or claims
    /// - `UntrustedIssuer` for issuers or audiences not configured
    /// - `KeySetFetchFailed` when the issuer's key set cannot be fetched
    /// - `InvalidSignature` for unknown keys, disallowed algorithms or bad
    ///   signatures
    /// - `TokenExpired` when `now >= exp`
    pub async fn verify(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<IdentityClaims, AuthorizerError> {
        let header = decode_header(token)
            .map_err(|e| AuthorizerError::MalformedToken(format!("token header: {e}")))?;
        if !self.algorithms.contains(&header.alg) {
            return Err(AuthorizerError::InvalidSignature(format!(
                "algorithm {:?} is not allowed",
                header.alg
            )));
        }
        let kid = header.kid.as_deref().ok_or_else(|| {
            AuthorizerError::MalformedToken("token header has no key id".to_owned())
        })?;

        let issuer = unverified_issuer(token)?;
        if !self.is_trusted(&issuer) {
            return Err(AuthorizerError::UntrustedIssuer(issuer));
        }

        let jwk = self
            .key_sets
            .key(&issuer, kid)
            .await?
            .ok_or_else(|| AuthorizerError::InvalidSignature(format!("unknown key id '{kid}'")))?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| AuthorizerError::InvalidSignature(format!("unusable key '{kid}': {e}")))?;

        let mut validation = Validation::new(header.alg);
        // Expiry is checked below with zero leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_issuer(&[issuer.as_str()]);
        // An empty list matches nothing, so a token is never accepted
        // without an audience check.
        validation.set_audience(&self.audiences);

        let verified = decode::<Value>(token, &key, &validation).map_err(map_jwt_error)?;
        let claims = IdentityClaims::from_payload(&verified.claims)
            .map_err(|e| AuthorizerError::MalformedToken(e.to_string()))?;

        if claims.is_expired_at(now) {
            return Err(AuthorizerError::TokenExpired);
        }
        Ok(claims)
    }

    fn is_trusted(&self, issuer: &str) -> bool {
        self.trusted_issuers
            .iter()
            .any(|prefix| issuer.starts_with(prefix.as_str()))
    }
}

/// `iss` of the payload, read without verifying the signature.
fn unverified_issuer(token: &str) -> Result<String, AuthorizerError> {
    let malformed = |what: &str| AuthorizerError::MalformedToken(what.to_owned());

    let payload = token.split('.').nth(1).ok_or_else(|| malformed("token has no payload"))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| malformed("token payload is not base64url"))?;
    let claims: Value =
        serde_json::from_slice(&bytes).map_err(|_| malformed("token payload is not JSON"))?;

    claims
        .get("iss")
        .and_then(Value::as_str)
        .filter(|iss| !iss.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| malformed("token has no issuer"))
}

fn map_jwt_error(e: JwtError) -> AuthorizerError {
    match e.kind() {
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            AuthorizerError::UntrustedIssuer(e.to_string())
        }
        ErrorKind::ExpiredSignature => AuthorizerError::TokenExpired,
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::MissingRequiredClaim(_) => AuthorizerError::MalformedToken(e.to_string()),
        _ => AuthorizerError::InvalidSignature(e.to_string()),
    }
}
