//! Shared Service Authorizer SDK
//!
//! This crate provides the public API for the `authorizer` module:
//!
//! - [`AuthorizerClient`] - Public API trait for the calling gateway
//! - [`IdentityClaims`] / [`UserRole`] - Verified identity, parsed fail-closed
//! - [`AccessPolicyDocument`] - Least-privilege, tenant-scoped grant
//! - [`ScopedCredentials`] - Time-boxed credentials bound to a policy
//! - [`AuthorizationRequest`] / [`AuthorizationDecision`] - Gateway contract
//! - [`ExecutionContext`] - Typed view of the context for downstream handlers
//! - [`AuthorizerError`] - Closed failure taxonomy
//! - Collaborator traits in [`plugin_api`] and [`sinks`]
//!
//! ## Usage
//!
//! ```ignore
//! use authorizer_sdk::{AuthorizationRequest, AuthorizerClient};
//!
//! let decision = authorizer.authorize(request).await;
//! if decision.is_allowed() {
//!     // forward the context bundle to the integration
//! }
//! ```

pub mod api;
pub mod claims;
pub mod context;
pub mod credentials;
pub mod error;
pub mod models;
pub mod plugin_api;
pub mod policy;
pub mod sinks;

// Re-export main types at crate root
pub use api::AuthorizerClient;
pub use claims::{ClaimsParseError, IdentityClaims, UserRole};
pub use context::{ContextError, ExecutionContext};
pub use credentials::{CredentialExchangeRequest, ScopedCredentials};
pub use error::{
    AccountError, AuthorizerError, BrokerError, FailureClass, KeySetError, TierKeyError,
};
pub use models::{
    AuthorizationDecision, AuthorizationRequest, ContextValue, GatewayPolicy,
    GatewayStatement,
};
pub use plugin_api::{AccountResolver, CredentialBroker, KeySetFetcher, TierKeyResolver};
pub use policy::{AccessPolicyDocument, ConditionOperator, Effect, PolicyStatement, TenantCondition};
pub use sinks::{AuditFields, AuditLevel, AuditSink, MetricOutcome, MetricsSink};
