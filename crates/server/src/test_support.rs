// Router harness shared by the route tests

use crate::api::create_router;
use crate::config::{AppState, Credentials, ServerConfig};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

/// Config whose upstreams all point at one mock server, with every
/// credential present.
pub(crate) fn config_for(upstream: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.upstream.composio_base_url = format!("{}/api/v3", upstream);
    config.upstream.composio_actions_url = format!("{}/api/v1", upstream);
    config.upstream.render_base_url = format!("{}/v1", upstream);
    config.upstream.read_timeout_secs = 5;
    config.upstream.execute_timeout_secs = 5;
    config.gateway.public_url = "https://gateway.test".to_string();
    config.with_credentials(Credentials::new(
        Some("ck-test".to_string()),
        Some("rnd-test".to_string()),
        Some("srv-test".to_string()),
        false,
    ))
}

pub(crate) fn router(config: ServerConfig) -> (Router, CancellationToken) {
    let shutdown = CancellationToken::new();
    let state = AppState::new(config, shutdown.clone()).unwrap();
    (create_router(state), shutdown)
}

pub(crate) fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub(crate) fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    post_raw(uri, body.to_string())
}

pub(crate) fn post_raw(uri: &str, body: impl Into<String>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.into()))
        .unwrap()
}

/// Send one request and decode the JSON body.
pub(crate) async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
