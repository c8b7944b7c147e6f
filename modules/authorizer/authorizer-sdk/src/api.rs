//! Public API trait for the authorizer.

use async_trait::async_trait;

use crate::models::{AuthorizationDecision, AuthorizationRequest};

/// Public API trait for the authorizer.
///
/// Infallible by contract: every failure is folded into a deny decision, so
/// callers always receive a well-formed response for the gateway.
///
/// # Example
///
/// ```ignore
/// let decision = authorizer.authorize(request).await;
/// let body = serde_json::to_string(&decision)?;
/// ```
#[async_trait]
pub trait AuthorizerClient: Send + Sync {
    async fn authorize(&self, request: AuthorizationRequest) -> AuthorizationDecision;
}
