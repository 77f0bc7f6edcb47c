//! Bridges an OpenID Connect login into a wallet session.
//!
//! The service exchanges the identity provider's authorization code for an ID
//! token, verifies it against the provider's published keys, and re-issues the
//! verified subject as a short-lived RS256 token that a custodial wallet SDK
//! accepts. The token is handed to the browser exactly once.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::JwksCache;
use crate::config::AppConfig;
use crate::oidc::{IdTokenVerifier, LoginFlow, TokenExchangeClient};

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod oidc;
pub mod security;
pub mod session;
pub mod transport;

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppResources {
    pub config: Arc<AppConfig>,
    pub flow: LoginFlow,
}

impl AppResources {
    /// Builds the outbound HTTP client and the JWKS cache from configuration.
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let cache = JwksCache::new(Duration::from_secs(config.http.jwks_cache_ttl_secs));

        Ok(Self::with_parts(config, http, cache))
    }

    /// Assembles resources from an existing client and cache (tests, benches).
    pub fn with_parts(config: AppConfig, http: reqwest::Client, cache: JwksCache) -> Self {
        let timeout = Duration::from_secs(config.http.timeout_secs);
        let config = Arc::new(config);
        let exchange = TokenExchangeClient::new(http.clone(), &config, timeout);
        let verifier = IdTokenVerifier::new(http, cache, timeout);

        Self {
            flow: LoginFlow::new(config.clone(), exchange, verifier),
            config,
        }
    }
}
