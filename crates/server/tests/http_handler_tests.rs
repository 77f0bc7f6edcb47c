//! HTTP handler tests for the non-flow endpoints.

mod common;

use axum::http::{StatusCode, header};
use axum_test::TestServer;
use common::{CLIENT_ID, resources, test_config};
use oidc_wallet_bridge::api::build_router;
use serde_json::Value;
use wiremock::MockServer;

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let provider = MockServer::start().await;
    let server = TestServer::new(build_router(resources(test_config(&provider.uri()))))
        .expect("create test server");

    let response = server.get("/healthz").await;

    response.assert_status_ok();
    response.assert_text("ok");
}

// =============================================================================
// JWKS Publication Tests
// =============================================================================

#[tokio::test]
async fn test_jwks_document_is_served_with_cache_header() {
    let provider = MockServer::start().await;
    let server = TestServer::new(build_router(resources(test_config(&provider.uri()))))
        .expect("create test server");

    let response = server.get("/.well-known/jwks.json").await;

    response.assert_status_ok();
    assert_eq!(
        response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=3600")
    );
    let body: Value = response.json();
    assert_eq!(body["keys"][0]["kty"], "RSA");
    assert_eq!(body["keys"][0]["kid"], "bridge-key-1");
}

#[tokio::test]
async fn test_unreadable_jwks_document_is_500() {
    let provider = MockServer::start().await;
    let mut config = test_config(&provider.uri());
    config.signing.jwks_path = std::env::temp_dir().join("definitely-missing-jwks.json");
    let server = TestServer::new(build_router(resources(config))).expect("create test server");

    let response = server.get("/.well-known/jwks.json").await;

    response.assert_status_internal_server_error();
    response.assert_json(&serde_json::json!({ "error": "Internal Server Error" }));
}

// =============================================================================
// Login Start Tests
// =============================================================================

#[tokio::test]
async fn test_login_redirects_to_provider() {
    let provider = MockServer::start().await;
    let server = TestServer::new(build_router(resources(test_config(&provider.uri()))))
        .expect("create test server");

    let response = server.get("/api/auth/worldid/login").await;

    response.assert_status(StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header");
    let url = reqwest::Url::parse(location).unwrap();

    assert!(location.starts_with(&format!("{}/authorize?", provider.uri())));
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };
    assert_eq!(param("client_id").as_deref(), Some(CLIENT_ID));
    assert_eq!(param("response_type").as_deref(), Some("code"));
    assert_eq!(
        param("redirect_uri").as_deref(),
        Some("https://bridge.example.org/api/auth/worldid")
    );
    assert_eq!(param("scope").as_deref(), Some("openid"));
}

#[tokio::test]
async fn test_openapi_docs_are_mounted() {
    let provider = MockServer::start().await;
    let server = TestServer::new(build_router(resources(test_config(&provider.uri()))))
        .expect("create test server");

    server.get("/api-docs").await.assert_status_ok();
}
