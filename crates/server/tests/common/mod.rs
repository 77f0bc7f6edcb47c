//! Shared fixtures: a mock identity provider and the RSA keys under `tests/fixtures`.
#![allow(dead_code)]

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use oidc_wallet_bridge::AppResources;
use oidc_wallet_bridge::config::{
    AppConfig, HttpClientConfig, OidcConfig, SigningConfig, TransportConfig, WalletConfig,
};
use oidc_wallet_bridge::transport::TransportMode;
use serde_json::{Value, json};
use std::path::PathBuf;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Key the mock provider signs ID tokens with; published as `key-1`.
pub const PROVIDER_KEY: &str = include_str!("../fixtures/provider_key.pem");
pub const PROVIDER_JWKS: &str = include_str!("../fixtures/provider_jwks.json");
/// Key this service signs session tokens with.
pub const SERVICE_KEY: &str = include_str!("../fixtures/service_key.pem");
pub const SERVICE_PUBLIC: &str = include_str!("../fixtures/service_public.pem");

pub const PROVIDER_KID: &str = "key-1";
pub const CLIENT_ID: &str = "app_test_client";
pub const CLIENT_SECRET: &str = "sk_test_secret";
pub const WALLET_CLIENT_ID: &str = "wallet-client-id";
pub const BASE_URL: &str = "https://bridge.example.org";

pub fn service_jwks_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/service_jwks.json")
}

/// Configuration pointing every provider endpoint at `provider_uri`.
pub fn test_config(provider_uri: &str) -> AppConfig {
    AppConfig {
        base_url: BASE_URL.into(),
        bind_address: "127.0.0.1:0".into(),
        oidc: OidcConfig {
            issuer: provider_uri.into(),
            authorization_endpoint: format!("{provider_uri}/authorize"),
            token_endpoint: format!("{provider_uri}/token"),
            userinfo_endpoint: Some(format!("{provider_uri}/userinfo")),
            jwks_uri: format!("{provider_uri}/jwks.json"),
            client_id: CLIENT_ID.into(),
            client_secret: CLIENT_SECRET.into(),
            redirect_uri: None,
            scope: "openid".into(),
        },
        wallet: WalletConfig {
            client_id: WALLET_CLIENT_ID.into(),
        },
        signing: SigningConfig {
            private_key: SERVICE_KEY.into(),
            jwks_path: service_jwks_path(),
        },
        transport: TransportConfig {
            mode: TransportMode::Cookie,
            cookie_max_age_secs: 60,
            secure_cookies: false,
        },
        http: HttpClientConfig {
            timeout_secs: 5,
            jwks_cache_ttl_secs: 3600,
        },
    }
}

pub fn resources(config: AppConfig) -> AppResources {
    AppResources::new(config).expect("build resources")
}

pub fn now() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp()
}

/// Claims of a token the provider would issue to `CLIENT_ID`.
pub fn id_token_claims(issuer: &str, subject: &str) -> Value {
    json!({
        "iss": issuer,
        "sub": subject,
        "aud": CLIENT_ID,
        "iat": now(),
        "exp": now() + 300,
    })
}

pub fn sign_id_token(claims: &Value, kid: Option<&str>, private_key_pem: &str) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).expect("fixture key");
    encode(&header, claims, &key).expect("sign id token")
}

/// A valid provider ID token for `subject`.
pub fn provider_id_token(issuer: &str, subject: &str) -> String {
    sign_id_token(
        &id_token_claims(issuer, subject),
        Some(PROVIDER_KID),
        PROVIDER_KEY,
    )
}

pub async fn mount_jwks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/jwks.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(PROVIDER_JWKS, "application/json"),
        )
        .mount(server)
        .await;
}

pub async fn mount_token_response(server: &MockServer, id_token: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "opaque-access-token",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "openid",
            "id_token": id_token,
        })))
        .mount(server)
        .await;
}
