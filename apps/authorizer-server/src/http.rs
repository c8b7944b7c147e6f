//! HTTP surface of the authorizer.
//!
//! `POST /v1/authorize` takes the gateway's request descriptor and always
//! answers `200` with a decision; denials are decisions too. Request ids are
//! generated when absent and echoed on the response.

use std::sync::Arc;

use authorizer_sdk::{AuthorizationDecision, AuthorizationRequest, AuthorizerClient};
use axum::Router;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, HeaderName, Request};
use axum::routing::{get, post};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::field::Empty;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the router around an authorizer client.
#[must_use]
pub fn router(client: Arc<dyn AuthorizerClient>) -> Router {
    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<axum::body::Body>| {
            let rid = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("n/a");
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri().path(),
                request_id = %rid,
                status = Empty,
                latency_ms = Empty,
            )
        })
        .on_response(
            |res: &axum::http::Response<axum::body::Body>,
             latency: std::time::Duration,
             span: &tracing::Span| {
                span.record("status", res.status().as_u16());
                span.record("latency_ms", latency.as_millis());
            },
        );

    // Outermost last: set the id, propagate it, then trace.
    Router::new()
        .route("/v1/authorize", post(authorize))
        .route("/healthz", get(healthz))
        .with_state(client)
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
}

#[allow(clippy::needless_pass_by_value)]
async fn authorize(
    State(client): State<Arc<dyn AuthorizerClient>>,
    headers: HeaderMap,
    Json(mut request): Json<AuthorizationRequest>,
) -> Json<AuthorizationDecision> {
    if request.request_id.trim().is_empty() {
        request.request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);
    }
    Json(client.authorize(request).await)
}

async fn healthz() -> &'static str {
    "ok"
}
