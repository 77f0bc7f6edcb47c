//! Authorization code → ID token exchange.

use crate::config::AppConfig;
use crate::error::TokenExchangeError;
use crate::security::secure_parse;
use serde::Deserialize;
use std::time::Duration;

/// Provider error bodies are truncated to this many bytes before logging.
const MAX_LOGGED_BODY: usize = 2048;

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    #[serde(default)]
    id_token: Option<String>,
}

/// Client for the provider's token endpoint, authenticating with HTTP Basic.
#[derive(Clone)]
pub struct TokenExchangeClient {
    http: reqwest::Client,
    token_endpoint: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    timeout: Duration,
}

impl TokenExchangeClient {
    pub fn new(http: reqwest::Client, config: &AppConfig, timeout: Duration) -> Self {
        Self {
            http,
            token_endpoint: config.oidc.token_endpoint.clone(),
            client_id: config.oidc.client_id.clone(),
            client_secret: config.oidc.client_secret.clone(),
            redirect_uri: config.redirect_uri(),
            timeout,
        }
    }

    /// Exchange `code` for the raw compact ID token. Makes exactly one request, no retries.
    #[tracing::instrument(skip_all, fields(token_endpoint = %self.token_endpoint))]
    pub async fn exchange_code(&self, code: &str) -> Result<String, TokenExchangeError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(TokenExchangeError::EmptyCode);
        }

        let response = self
            .http
            .post(&self.token_endpoint)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body[..body.len().min(MAX_LOGGED_BODY)]);
            return Err(TokenExchangeError::Rejected {
                status,
                body: body.into_owned(),
            });
        }

        let parsed: TokenEndpointResponse = secure_parse(&body)
            .map_err(|e| TokenExchangeError::MalformedResponse(e.to_string()))?;

        match parsed.id_token {
            Some(id_token) if !id_token.is_empty() => {
                tracing::debug!("token endpoint returned an id_token");
                Ok(id_token)
            }
            _ => Err(TokenExchangeError::MissingIdToken),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> TokenExchangeError {
        if err.is_timeout() {
            TokenExchangeError::Timeout(self.timeout)
        } else {
            TokenExchangeError::Network(err.to_string())
        }
    }
}
