//! Hands a session token (or a generic failure) from the callback redirect to
//! the browser exactly once.
//!
//! Cookie mode sets a short-lived `HttpOnly` cookie that the page reads through
//! `POST /api/auth/session`, which also deletes it. Query mode appends
//! `?token=` to the redirect; the page is expected to strip it from the URL
//! immediately (see [`strip_transport_params`]).

use crate::config::TransportConfig;
use crate::error::AuthFlowError;
use crate::oidc::SessionToken;
use axum::{
    http::{HeaderMap, StatusCode, header},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const TOKEN_COOKIE: &str = "temp_auth_token";
pub const ERROR_COOKIE: &str = "temp_auth_error";
pub const TOKEN_PARAM: &str = "token";
pub const ERROR_PARAM: &str = "error";
/// The only failure reason the browser ever sees.
pub const AUTH_FAILED: &str = "auth_failed";
pub const MAX_COOKIE_AGE_SECS: u64 = 60;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Cookie,
    Query,
}

/// What the browser gets back from the one-shot read.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConsumedSession {
    pub token: Option<String>,
    pub error: Option<String>,
}

pub struct TransportBridge<'a> {
    config: &'a TransportConfig,
    base_url: &'a str,
}

impl<'a> TransportBridge<'a> {
    pub fn new(config: &'a TransportConfig, base_url: &'a str) -> Self {
        Self { config, base_url }
    }

    /// 302 back to the application carrying `token`.
    pub fn deliver_token(&self, token: &SessionToken) -> Response {
        self.deliver(TOKEN_COOKIE, TOKEN_PARAM, token.as_str())
    }

    /// 302 back to the application carrying the generic failure reason.
    pub fn deliver_error(&self) -> Response {
        self.deliver(ERROR_COOKIE, ERROR_PARAM, AUTH_FAILED)
    }

    fn deliver(&self, cookie: &str, param: &str, value: &str) -> Response {
        let mut target = match reqwest::Url::parse(self.base_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(error = %e, "base_url is not a valid redirect target");
                return AuthFlowError::ConfigurationMissing("base_url").into_response();
            }
        };

        match self.config.mode {
            TransportMode::Cookie => {
                let max_age = self.config.cookie_max_age_secs.min(MAX_COOKIE_AGE_SECS);
                let set_cookie = build_set_cookie(cookie, value, max_age, self.config.secure_cookies);
                (
                    StatusCode::FOUND,
                    [
                        (header::LOCATION, target.to_string()),
                        (header::SET_COOKIE, set_cookie),
                        (header::CACHE_CONTROL, "no-store".to_string()),
                    ],
                )
                    .into_response()
            }
            TransportMode::Query => {
                target.query_pairs_mut().append_pair(param, value);
                (
                    StatusCode::FOUND,
                    [
                        (header::LOCATION, target.to_string()),
                        (header::CACHE_CONTROL, "no-store".to_string()),
                    ],
                )
                    .into_response()
            }
        }
    }

    /// Read both transport cookies and expire them in the same response.
    ///
    /// Reading again afterwards yields an empty [`ConsumedSession`].
    pub fn consume(&self, headers: &HeaderMap) -> Response {
        let consumed = ConsumedSession {
            token: read_cookie(headers, TOKEN_COOKIE).map(str::to_string),
            error: read_cookie(headers, ERROR_COOKIE).map(str::to_string),
        };
        let secure = self.config.secure_cookies;

        (
            AppendHeaders([
                (header::SET_COOKIE, clear_cookie(TOKEN_COOKIE, secure)),
                (header::SET_COOKIE, clear_cookie(ERROR_COOKIE, secure)),
            ]),
            [(header::CACHE_CONTROL, "no-store")],
            axum::Json(consumed),
        )
            .into_response()
    }
}

pub fn build_set_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let mut out = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}");
    if secure {
        out.push_str("; Secure");
    }
    out
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    build_set_cookie(name, "", 0, secure)
}

/// Value of cookie `name` across all `Cookie` headers; empty values count as absent.
pub fn read_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// The URL the page should replace its location with after reading a query-mode token.
pub fn strip_transport_params(url: &reqwest::Url) -> reqwest::Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != TOKEN_PARAM && key != ERROR_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut clean = url.clone();
    clean.set_query(None);
    if !kept.is_empty() {
        clean.query_pairs_mut().extend_pairs(kept);
    }
    clean
}
