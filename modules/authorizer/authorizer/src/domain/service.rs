//! Authorization orchestrator.
//!
//! Sequences token verification, region resolution, policy synthesis and the
//! credential exchange for one request, then assembles the decision. Every
//! path, including timeouts, ends in a well-formed decision.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use authorizer_sdk::context::keys;
use authorizer_sdk::models::cors_context;
use authorizer_sdk::sinks::{AuditFields, AuditLevel, MetricOutcome};
use authorizer_sdk::{
    AccountError, AccountResolver, AuditSink, AuthorizationDecision, AuthorizationRequest,
    AuthorizerError, BrokerError, ContextValue, CredentialBroker, CredentialExchangeRequest,
    FailureClass, IdentityClaims, KeySetFetcher, MetricsSink, ScopedCredentials, TierKeyError,
    TierKeyResolver,
};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::key_set::KeySetCache;
use super::policy::PolicySynthesizer;
use super::region::RegionTable;
use super::session::session_label;
use super::token_verifier::TokenVerifier;
use crate::config::{AuthorizerConfig, ConfigError, TimeoutConfig};

/// Operation name of the authorization metric.
pub const AUTHORIZE_OPERATION: &str = "authorize";
/// Operation name of the usage-key lookup metric.
pub const TIER_KEY_OPERATION: &str = "tier_key";

/// External collaborators injected at construction.
pub struct Collaborators {
    pub key_sets: Arc<dyn KeySetFetcher>,
    pub broker: Arc<dyn CredentialBroker>,
    /// Required unless the account id is configured statically.
    pub accounts: Option<Arc<dyn AccountResolver>>,
    pub tier_keys: Option<Arc<dyn TierKeyResolver>>,
    pub audit: Arc<dyn AuditSink>,
    pub metrics: Arc<dyn MetricsSink>,
}

enum AccountSource {
    Static(String),
    Resolver(Arc<dyn AccountResolver>),
}

/// Result of a successful evaluation, before assembly.
struct Grant {
    claims: IdentityClaims,
    region: String,
    credentials: ScopedCredentials,
    usage_key: Option<String>,
}

/// What was learned about the caller before a failure.
#[derive(Default)]
struct Trail {
    tenant_id: Option<String>,
    user_role: Option<String>,
    region: Option<String>,
}

/// Authorization orchestrator.
pub struct Service {
    verifier: TokenVerifier,
    synthesizer: PolicySynthesizer,
    regions: RegionTable,
    broker: Arc<dyn CredentialBroker>,
    account: AccountSource,
    tier_keys: Option<Arc<dyn TierKeyResolver>>,
    audit: Arc<dyn AuditSink>,
    metrics: Arc<dyn MetricsSink>,
    trust_role_name: String,
    trust_role_arn: Option<String>,
    credential_duration_secs: u32,
    service_identifier: String,
    usage_tier: String,
    timeouts: TimeoutConfig,
}

impl Service {
    /// Build the orchestrator from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration is invalid or neither a
    /// static account id nor an account resolver is available.
    pub fn new(cfg: &AuthorizerConfig, collaborators: Collaborators) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let account = match (&cfg.account_id, collaborators.accounts) {
            (Some(id), _) if !id.trim().is_empty() => AccountSource::Static(id.clone()),
            (_, Some(resolver)) => AccountSource::Resolver(resolver),
            _ => return Err(ConfigError::NoAccountSource),
        };
        let tier_keys = collaborators.tier_keys.filter(|_| cfg.usage_key_lookup);

        let key_sets = Arc::new(KeySetCache::new(collaborators.key_sets, &cfg.key_set));

        Ok(Self {
            verifier: TokenVerifier::new(key_sets, cfg),
            synthesizer: PolicySynthesizer::new(cfg.shared_table.clone()),
            regions: RegionTable::new(cfg.region_aliases.clone()),
            broker: collaborators.broker,
            account,
            tier_keys,
            audit: collaborators.audit,
            metrics: collaborators.metrics,
            trust_role_name: cfg.trust_role_name.clone(),
            trust_role_arn: cfg.trust_role_arn.clone(),
            credential_duration_secs: cfg.credential_duration_secs,
            service_identifier: cfg.service_identifier.clone(),
            usage_tier: cfg.usage_tier.clone(),
            timeouts: cfg.timeouts.clone(),
        })
    }

    /// Authorize one request.
    ///
    /// The whole flow runs under the request deadline; when it elapses, the
    /// pending network call is dropped and the request is denied.
    #[tracing::instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn authorize(&self, request: &AuthorizationRequest) -> AuthorizationDecision {
        let mut trail = Trail::default();
        let deadline = self.timeouts.request_deadline();
        let outcome = tokio::time::timeout(deadline, self.evaluate(request, &mut trail))
            .await
            .unwrap_or(Err(AuthorizerError::DeadlineExceeded));

        match outcome {
            Ok(grant) => self.allow(request, grant),
            Err(error) => self.deny(request, &trail, error),
        }
    }

    async fn evaluate(
        &self,
        request: &AuthorizationRequest,
        trail: &mut Trail,
    ) -> Result<Grant, AuthorizerError> {
        let token = request
            .bearer_token()
            .ok_or_else(|| AuthorizerError::MalformedToken("missing bearer token".to_owned()))?;

        let claims = self.verifier.verify(token, OffsetDateTime::now_utc()).await?;
        trail.tenant_id = Some(claims.tenant_id().to_owned());
        trail.user_role = Some(claims.user_role().to_string());

        let region = self
            .regions
            .resolve(claims.region_alias())
            .ok_or_else(|| AuthorizerError::UnmappedRegionAlias(claims.region_alias().to_owned()))?
            .to_owned();
        trail.region = Some(region.clone());

        let account_id = self.account_id().await?;

        let policy = self.synthesizer.synthesize(
            claims.user_role(),
            claims.tenant_id(),
            &self.service_identifier,
            &region,
            &account_id,
        );
        if !policy.grants_anything() {
            return Err(AuthorizerError::NoApplicablePolicy {
                role: claims.user_role().to_string(),
            });
        }

        let exchange = CredentialExchangeRequest {
            trust_role: self.trust_role(&account_id),
            session_label: session_label(claims.tenant_id(), &request.request_id),
            policy,
            duration_secs: self.credential_duration_secs,
        };
        let credentials = bounded(
            self.timeouts.exchange(),
            self.broker.exchange(&exchange),
            BrokerError::Timeout,
        )
        .await?;

        let usage_key = self.usage_key(request, &claims).await;

        Ok(Grant {
            claims,
            region,
            credentials,
            usage_key,
        })
    }

    async fn account_id(&self) -> Result<String, AuthorizerError> {
        match &self.account {
            AccountSource::Static(id) => Ok(id.clone()),
            AccountSource::Resolver(resolver) => {
                let id = bounded(
                    self.timeouts.account(),
                    resolver.account_id(),
                    AccountError::Timeout,
                )
                .await?;
                Ok(id)
            }
        }
    }

    fn trust_role(&self, account_id: &str) -> String {
        self.trust_role_arn.clone().unwrap_or_else(|| {
            format!("arn:aws:iam::{account_id}:role/{}", self.trust_role_name)
        })
    }

    /// Best-effort usage key: a miss is reported and the request proceeds.
    async fn usage_key(
        &self,
        request: &AuthorizationRequest,
        claims: &IdentityClaims,
    ) -> Option<String> {
        let resolver = self.tier_keys.as_ref()?;
        match bounded(
            self.timeouts.tier_key(),
            resolver.tier_key(&self.usage_tier),
            TierKeyError::Timeout,
        )
        .await
        {
            Ok(key) => Some(key),
            Err(e) => {
                let error = AuthorizerError::from(e);
                tracing::warn!(
                    tenant_id = claims.tenant_id(),
                    tier = %self.usage_tier,
                    error = %error,
                    "usage key lookup failed, continuing without it"
                );
                let mut fields = base_fields(request);
                fields.insert("tenant_id".to_owned(), claims.tenant_id().to_owned());
                fields.insert("error_code".to_owned(), error.code().to_owned());
                self.audit.log(AuditLevel::Warn, &error.to_string(), &fields);
                self.metrics.record(
                    MetricOutcome::Error,
                    TIER_KEY_OPERATION,
                    &BTreeMap::from([
                        ("tenant".to_owned(), claims.tenant_id().to_owned()),
                        ("request_id".to_owned(), request.request_id.clone()),
                        ("reason".to_owned(), error.code().to_owned()),
                    ]),
                );
                None
            }
        }
    }

    fn allow(&self, request: &AuthorizationRequest, grant: Grant) -> AuthorizationDecision {
        let Grant {
            claims,
            region,
            credentials,
            usage_key,
        } = grant;

        let mut context = cors_context();
        let mut put = |key: &str, value: ContextValue| {
            context.insert(key.to_owned(), value);
        };
        put(keys::ACCESS_KEY_ID, credentials.access_key_id.clone().into());
        put(
            keys::SECRET_ACCESS_KEY,
            ContextValue::Secret(credentials.secret_access_key),
        );
        put(keys::SESSION_TOKEN, ContextValue::Secret(credentials.session_token));
        if let Ok(expiry) = credentials.expiration.format(&Rfc3339) {
            put(keys::CREDENTIAL_EXPIRY, expiry.into());
        }
        put(keys::TENANT_ID, claims.tenant_id().into());
        put(keys::USER_ROLE, claims.user_role().as_str().into());
        put(keys::EMAIL, claims.email().into());
        put(keys::REGION, claims.region_alias().into());
        put(keys::AWS_REGION, region.as_str().into());
        put(keys::FIRST_NAME, claims.first_name().into());
        put(keys::LAST_NAME, claims.last_name().into());
        put(keys::REQUEST_ID, request.request_id.as_str().into());
        put(keys::USER_ID, claims.subject().into());

        let mut fields = base_fields(request);
        fields.insert("tenant_id".to_owned(), claims.tenant_id().to_owned());
        fields.insert("user_role".to_owned(), claims.user_role().to_string());
        fields.insert("region".to_owned(), region.clone());
        fields.insert("access_key_id".to_owned(), credentials.access_key_id);
        fields.insert("usage_key".to_owned(), usage_key.is_some().to_string());
        self.audit.log(AuditLevel::Info, "request authorized", &fields);
        self.metrics.record(
            MetricOutcome::Success,
            AUTHORIZE_OPERATION,
            &BTreeMap::from([
                ("tenant".to_owned(), claims.tenant_id().to_owned()),
                ("request_id".to_owned(), request.request_id.clone()),
                ("region".to_owned(), region),
            ]),
        );
        tracing::info!(tenant_id = claims.tenant_id(), "request authorized");

        AuthorizationDecision::allow(claims.subject(), &request.method_arn, context, usage_key)
    }

    fn deny(
        &self,
        request: &AuthorizationRequest,
        trail: &Trail,
        error: AuthorizerError,
    ) -> AuthorizationDecision {
        let mut fields = base_fields(request);
        fields.insert("error_code".to_owned(), error.code().to_owned());
        let mut tags = BTreeMap::from([
            ("request_id".to_owned(), request.request_id.clone()),
            ("reason".to_owned(), error.code().to_owned()),
        ]);
        if let Some(tenant) = &trail.tenant_id {
            fields.insert("tenant_id".to_owned(), tenant.clone());
            tags.insert("tenant".to_owned(), tenant.clone());
        }
        if let Some(role) = &trail.user_role {
            fields.insert("user_role".to_owned(), role.clone());
        }
        if let Some(region) = &trail.region {
            fields.insert("region".to_owned(), region.clone());
            tags.insert("region".to_owned(), region.clone());
        }

        let level = match error.class() {
            FailureClass::Configuration => {
                fields.insert("alert".to_owned(), "configuration".to_owned());
                tracing::error!(
                    alert = "configuration",
                    error = %error,
                    "authorizer misconfigured"
                );
                AuditLevel::Error
            }
            FailureClass::Dependency => {
                tracing::error!(error = %error, "authorization dependency failed");
                AuditLevel::Error
            }
            FailureClass::Rejected | FailureClass::Degraded => {
                tracing::warn!(error = %error, "request denied");
                AuditLevel::Warn
            }
        };
        self.audit.log(level, &error.to_string(), &fields);
        self.metrics
            .record(MetricOutcome::Error, AUTHORIZE_OPERATION, &tags);

        AuthorizationDecision::deny(&request.method_arn, &request.request_id, error)
    }
}

fn base_fields(request: &AuthorizationRequest) -> AuditFields {
    BTreeMap::from([
        ("request_id".to_owned(), request.request_id.clone()),
        ("method_arn".to_owned(), request.method_arn.clone()),
    ])
}

/// Run a collaborator call under `limit`; elapsing counts as `on_timeout`.
async fn bounded<T, E>(
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
    on_timeout: E,
) -> Result<T, E> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(on_timeout))
}
