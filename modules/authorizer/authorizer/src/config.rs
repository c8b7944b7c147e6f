//! Configuration for the authorizer.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Shortest validity window the delegation protocol accepts.
pub const MIN_CREDENTIAL_DURATION_SECS: u32 = 900;
/// Longest validity window the delegation protocol accepts.
pub const MAX_CREDENTIAL_DURATION_SECS: u32 = 43_200;

/// Configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizerConfig {
    /// Issuer prefixes whose tokens are accepted, e.g.
    /// `https://cognito-idp.eu-west-2.amazonaws.com/`.
    pub trusted_issuers: Vec<String>,

    /// Accepted `aud` values (the app client ids). Required: a trusted
    /// prefix may cover issuers the operator does not control.
    pub audiences: Vec<String>,

    /// Accepted signing algorithms (`RS256`, `ES256`, ...).
    pub allowed_algorithms: Vec<String>,

    pub key_set: KeySetConfig,

    /// Static account id. When unset, the account resolver is queried.
    pub account_id: Option<String>,

    /// Name of the trust role assumed for every request.
    pub trust_role_name: String,

    /// Full trust role identifier; overrides `trust_role_name`.
    pub trust_role_arn: Option<String>,

    /// Validity of issued credentials, in seconds.
    pub credential_duration_secs: u32,

    /// Service whose shared table tenants are scoped into.
    pub service_identifier: String,

    /// Name of the shared multi-tenant table.
    pub shared_table: String,

    /// Region alias (as carried in tokens) to deployment region.
    pub region_aliases: BTreeMap<String, String>,

    /// Usage tier whose key is attached to allowed decisions.
    pub usage_tier: String,

    /// Whether to look up the usage tier key at all.
    pub usage_key_lookup: bool,

    pub timeouts: TimeoutConfig,

    /// Prefix of emitted metric names.
    pub metrics_prefix: String,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            trusted_issuers: Vec::new(),
            audiences: Vec::new(),
            allowed_algorithms: vec!["RS256".to_owned()],
            key_set: KeySetConfig::default(),
            account_id: None,
            trust_role_name: "AuthorizerAccessRole".to_owned(),
            trust_role_arn: None,
            credential_duration_secs: MIN_CREDENTIAL_DURATION_SECS,
            service_identifier: "SharedServices".to_owned(),
            shared_table: "SharedServices".to_owned(),
            region_aliases: default_region_aliases(),
            usage_tier: "Premier".to_owned(),
            usage_key_lookup: true,
            timeouts: TimeoutConfig::default(),
            metrics_prefix: "authorizer".to_owned(),
        }
    }
}

fn default_region_aliases() -> BTreeMap<String, String> {
    [
        ("eu1", "eu-west-2"),
        ("us1", "us-east-1"),
        ("ap1", "ap-southeast-1"),
    ]
    .into_iter()
    .map(|(alias, region)| (alias.to_owned(), region.to_owned()))
    .collect()
}

/// Key-set cache settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeySetConfig {
    pub cache_ttl_secs: u64,
    pub fetch_timeout_ms: u64,
    /// Minimum age of a cached key set before an unknown key id may trigger
    /// a refresh.
    pub min_refresh_interval_secs: u64,
    /// How long a failed fetch is answered from memory. Zero disables it.
    pub failure_ttl_secs: u64,
    /// Upper bound on the number of issuers held.
    pub max_issuers: usize,
}

impl Default for KeySetConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 3600,
            fetch_timeout_ms: 3000,
            min_refresh_interval_secs: 30,
            failure_ttl_secs: 10,
            max_issuers: 16,
        }
    }
}

impl KeySetConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    #[must_use]
    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.min_refresh_interval_secs)
    }

    #[must_use]
    pub fn failure_ttl(&self) -> Duration {
        Duration::from_secs(self.failure_ttl_secs)
    }
}

/// Timeouts of the network steps, in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    pub exchange_ms: u64,
    pub tier_key_ms: u64,
    pub account_ms: u64,
    /// Upper bound for the whole authorization.
    pub request_deadline_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            exchange_ms: 3000,
            tier_key_ms: 1000,
            account_ms: 2000,
            request_deadline_ms: 8000,
        }
    }
}

impl TimeoutConfig {
    #[must_use]
    pub fn exchange(&self) -> Duration {
        Duration::from_millis(self.exchange_ms)
    }

    #[must_use]
    pub fn tier_key(&self) -> Duration {
        Duration::from_millis(self.tier_key_ms)
    }

    #[must_use]
    pub fn account(&self) -> Duration {
        Duration::from_millis(self.account_ms)
    }

    #[must_use]
    pub fn request_deadline(&self) -> Duration {
        Duration::from_millis(self.request_deadline_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one trusted issuer must be configured")]
    NoTrustedIssuers,

    #[error("at least one audience must be configured")]
    NoAudiences,

    #[error("at least one signing algorithm must be allowed")]
    NoAlgorithms,

    #[error("unsupported signing algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error(
        "credential duration {0}s is outside {MIN_CREDENTIAL_DURATION_SECS}..={MAX_CREDENTIAL_DURATION_SECS}"
    )]
    CredentialDuration(u32),

    #[error("timeout '{0}' must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("limit '{0}' must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("region alias table is empty")]
    NoRegionAliases,

    #[error("field '{0}' must not be empty")]
    Empty(&'static str),

    #[error("no account id configured and no account resolver available")]
    NoAccountSource,
}

impl AuthorizerConfig {
    /// Check the configuration at startup.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trusted_issuers.iter().all(|issuer| issuer.trim().is_empty()) {
            return Err(ConfigError::NoTrustedIssuers);
        }
        if self.audiences.iter().all(|aud| aud.trim().is_empty()) {
            return Err(ConfigError::NoAudiences);
        }
        if self.allowed_algorithms.is_empty() {
            return Err(ConfigError::NoAlgorithms);
        }
        for alg in &self.allowed_algorithms {
            alg.parse::<jsonwebtoken::Algorithm>()
                .map_err(|_| ConfigError::UnsupportedAlgorithm(alg.clone()))?;
        }
        if !(MIN_CREDENTIAL_DURATION_SECS..=MAX_CREDENTIAL_DURATION_SECS)
            .contains(&self.credential_duration_secs)
        {
            return Err(ConfigError::CredentialDuration(self.credential_duration_secs));
        }
        for (name, value) in [
            ("key_set.fetch_timeout_ms", self.key_set.fetch_timeout_ms),
            ("timeouts.exchange_ms", self.timeouts.exchange_ms),
            ("timeouts.tier_key_ms", self.timeouts.tier_key_ms),
            ("timeouts.account_ms", self.timeouts.account_ms),
            ("timeouts.request_deadline_ms", self.timeouts.request_deadline_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTimeout(name));
            }
        }
        if self.key_set.max_issuers == 0 {
            return Err(ConfigError::ZeroLimit("key_set.max_issuers"));
        }
        if self.region_aliases.is_empty() {
            return Err(ConfigError::NoRegionAliases);
        }
        for (name, value) in [
            ("trust_role_name", &self.trust_role_name),
            ("service_identifier", &self.service_identifier),
            ("shared_table", &self.shared_table),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Empty(name));
            }
        }
        Ok(())
    }
}
