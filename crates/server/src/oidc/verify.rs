//! ID token verification against the provider's published key set.

use crate::cache::JwksCache;
use crate::config::OidcConfig;
use crate::error::InvalidTokenError;
use crate::security::secure_parse;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Only asymmetric algorithms; a shared-secret token can never come from the provider.
pub const ALLOWED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
];

/// The outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
    /// `kid` of the provider key that signed the ID token.
    pub key_id: String,
}

#[derive(Deserialize)]
struct IdTokenClaims {
    #[serde(default)]
    sub: Option<String>,
}

#[derive(Clone)]
pub struct IdTokenVerifier {
    http: reqwest::Client,
    cache: JwksCache,
    timeout: Duration,
}

impl IdTokenVerifier {
    pub fn new(http: reqwest::Client, cache: JwksCache, timeout: Duration) -> Self {
        Self {
            http,
            cache,
            timeout,
        }
    }

    pub fn cache(&self) -> &JwksCache {
        &self.cache
    }

    /// Verify signature, issuer, audience, expiry and subject of `id_token`.
    #[tracing::instrument(skip_all, fields(jwks_uri = %config.jwks_uri))]
    pub async fn verify(
        &self,
        id_token: &str,
        config: &OidcConfig,
    ) -> Result<VerifiedIdentity, InvalidTokenError> {
        let header =
            decode_header(id_token).map_err(|e| InvalidTokenError::Malformed(e.to_string()))?;

        if !ALLOWED_ALGORITHMS.contains(&header.alg) {
            return Err(InvalidTokenError::UnsupportedAlgorithm(format!(
                "{:?}",
                header.alg
            )));
        }

        let key_id = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(InvalidTokenError::MissingKeyId)?;

        let jwk = self.resolve_key(&config.jwks_uri, &key_id).await?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| InvalidTokenError::UnknownKey(format!("{key_id}: {e}")))?;

        let mut validation = Validation::new(header.alg);
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.client_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let data = decode::<IdTokenClaims>(id_token, &key, &validation)?;

        let subject = data
            .claims
            .sub
            .filter(|sub| !sub.trim().is_empty())
            .ok_or(InvalidTokenError::MissingSubject)?;

        tracing::debug!(kid = %key_id, "id token verified");
        Ok(VerifiedIdentity { subject, key_id })
    }

    /// Cached lookup; a miss or an unknown `kid` triggers exactly one re-fetch.
    async fn resolve_key(&self, jwks_uri: &str, key_id: &str) -> Result<Jwk, InvalidTokenError> {
        if let Some(set) = self.cache.get(&jwks_uri.to_string())
            && let Some(jwk) = set.find(key_id)
        {
            return Ok(jwk.clone());
        }

        let set = self.fetch_key_set(jwks_uri).await?;
        set.find(key_id)
            .cloned()
            .ok_or_else(|| InvalidTokenError::UnknownKey(key_id.to_string()))
    }

    /// Fetch the key set and replace the cached copy.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_key_set(&self, jwks_uri: &str) -> Result<Arc<JwkSet>, InvalidTokenError> {
        let response = self
            .http
            .get(jwks_uri)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| self.fetch_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InvalidTokenError::KeySetUnavailable(format!(
                "HTTP {status}"
            )));
        }

        let body = response.bytes().await.map_err(|e| self.fetch_error(e))?;
        let set: JwkSet = secure_parse(&body)
            .map_err(|e| InvalidTokenError::KeySetUnavailable(format!("invalid key set: {e}")))?;

        tracing::info!(keys = set.keys.len(), "refreshed provider key set");
        let set = Arc::new(set);
        self.cache.insert(jwks_uri.to_string(), set.clone());
        Ok(set)
    }

    fn fetch_error(&self, err: reqwest::Error) -> InvalidTokenError {
        if err.is_timeout() {
            InvalidTokenError::KeySetUnavailable(format!("timed out after {:?}", self.timeout))
        } else {
            InvalidTokenError::KeySetUnavailable(err.to_string())
        }
    }
}
