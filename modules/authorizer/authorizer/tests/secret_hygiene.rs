#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Secret material never reaches logs or audit events.

mod common;

use std::sync::Arc;

use authorizer::infra::{HttpKeySetFetcher, TracingAuditSink, TracingMetricsSink};
use authorizer::{Collaborators, Service};
use common::{BrokerMode, Harness, SECRET_ACCESS_KEY, SESSION_TOKEN, jwk_a, request};
use tracing_test::traced_test;

#[traced_test]
#[tokio::test]
async fn credentials_and_token_are_not_logged() {
    let harness = Harness::start(BrokerMode::Succeed).await;
    harness.serve_keys(vec![jwk_a()]).await;
    let cfg = harness.config();
    let service = Service::new(
        &cfg,
        Collaborators {
            key_sets: Arc::new(HttpKeySetFetcher::new(cfg.key_set.fetch_timeout()).unwrap()),
            broker: harness.broker.clone(),
            accounts: Some(harness.accounts.clone()),
            tier_keys: Some(harness.tier_keys.clone()),
            audit: Arc::new(TracingAuditSink),
            metrics: Arc::new(TracingMetricsSink::new(cfg.metrics_prefix.clone())),
        },
    )
    .unwrap();
    let token = harness.token("T1", "TenantUser", "eu1");

    let decision = service.authorize(&request(&token)).await;

    assert!(decision.is_allowed());
    assert!(logs_contain("request authorized"));
    assert!(logs_contain("authorizer.authorize.success"));
    assert!(!logs_contain(SECRET_ACCESS_KEY));
    assert!(!logs_contain(SESSION_TOKEN));
    assert!(!logs_contain(&token));
    assert!(!format!("{decision:?}").contains(SESSION_TOKEN));
}

#[tokio::test]
async fn audit_events_carry_no_secrets() {
    let harness = Harness::start(BrokerMode::Succeed).await;
    harness.serve_keys(vec![jwk_a()]).await;
    let service = harness.service(&harness.config());

    let decision = service
        .authorize(&request(&harness.token("T1", "TenantUser", "eu1")))
        .await;

    assert!(decision.is_allowed());
    for (_, message, fields) in harness.audit.events() {
        let rendered = format!("{message} {fields:?}");
        assert!(!rendered.contains(SECRET_ACCESS_KEY));
        assert!(!rendered.contains(SESSION_TOKEN));
    }
}
