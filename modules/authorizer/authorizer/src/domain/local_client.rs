//! Local (in-process) client for the authorizer.

use std::sync::Arc;

use async_trait::async_trait;
use authorizer_sdk::{AuthorizationDecision, AuthorizationRequest, AuthorizerClient};

use super::Service;

/// Local client wrapping the service.
#[derive(Clone)]
pub struct AuthorizerLocalClient {
    svc: Arc<Service>,
}

impl AuthorizerLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

#[async_trait]
impl AuthorizerClient for AuthorizerLocalClient {
    async fn authorize(&self, request: AuthorizationRequest) -> AuthorizationDecision {
        self.svc.authorize(&request).await
    }
}
