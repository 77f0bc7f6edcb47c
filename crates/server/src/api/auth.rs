//! Login endpoints.
//!
//! - `GET /api/auth/worldid/login` sends the browser to the provider
//! - `GET /api/auth/worldid` is the provider's authorization code callback
//! - `POST /api/auth/session` hands the delivered token to the page once

use crate::AppResources;
use crate::error::{AuthFlowError, ErrorBody};
use crate::oidc::AUTH_TAG;
use crate::transport::{ConsumedSession, TransportBridge};
use axum::{
    Extension,
    extract::Query,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::{router::OpenApiRouter, routes};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CallbackParams {
    /// Authorization code issued by the provider.
    #[serde(default)]
    pub code: Option<String>,
}

/// Creates the login router.
pub fn router() -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(callback))
        .routes(routes!(login))
        .routes(routes!(consume_session))
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/worldid",
    params(CallbackParams),
    tag = AUTH_TAG,
    operation_id = "Provider Callback",
    summary = "Complete the OpenID Connect login",
    description = "Exchanges the authorization code, verifies the ID token against the provider key set and \
                   re-issues the subject as a wallet session token.\n\n\
                   The token is delivered with a redirect to the application, either in a short-lived \
                   `temp_auth_token` cookie or a `token` query parameter depending on configuration. \
                   Any failure after the code was received redirects with the generic reason `auth_failed`.",
    responses(
        (status = 302, description = "Redirect to the application carrying the session token or `auth_failed`"),
        (status = 400, description = "No code provided", body = ErrorBody, content_type = "application/json"),
        (status = 500, description = "Server configuration incomplete", body = ErrorBody, content_type = "application/json")
    )
)]
pub async fn callback(
    Extension(resources): Extension<AppResources>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|code| !code.trim().is_empty()) else {
        tracing::warn!("callback without authorization code");
        return AuthFlowError::MissingInput.into_response();
    };

    let config = &resources.config;
    if let Err(e) = config.require() {
        tracing::error!(error = %e, "refusing login with incomplete configuration");
        return e.into_response();
    }

    let bridge = TransportBridge::new(&config.transport, &config.base_url);
    match resources.flow.complete(&code).await {
        Ok(token) => bridge.deliver_token(&token),
        Err(e) => {
            // Debug keeps provider bodies and verification detail in the log only.
            tracing::error!(error = ?e, status = %e.status_code(), "login failed");
            bridge.deliver_error()
        }
    }
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/worldid/login",
    tag = AUTH_TAG,
    operation_id = "Start Login",
    summary = "Redirect to the identity provider",
    description = "Builds the provider authorization URL from configuration (`client_id`, `response_type=code`, \
                   `redirect_uri`, `scope`) and redirects the browser to it.",
    responses(
        (status = 302, description = "Redirect to the provider authorization endpoint"),
        (status = 500, description = "Server configuration incomplete", body = ErrorBody, content_type = "application/json")
    )
)]
pub async fn login(Extension(resources): Extension<AppResources>) -> Response {
    match resources.config.authorization_url() {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url.to_string())]).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "cannot build authorization url");
            AuthFlowError::ConfigurationMissing("oidc.authorization_endpoint").into_response()
        }
    }
}

#[tracing::instrument(skip_all)]
#[utoipa::path(
    post,
    path = "/session",
    tag = AUTH_TAG,
    operation_id = "Consume Session Token",
    summary = "Read and clear the delivered session token",
    description = "Returns the value of the `temp_auth_token` and `temp_auth_error` cookies and expires both in the \
                   same response, so a token can be picked up at most once. Same-origin use only.",
    responses(
        (status = 200, description = "Delivered token and/or error; both null when nothing is pending", body = ConsumedSession, content_type = "application/json")
    )
)]
pub async fn consume_session(
    Extension(resources): Extension<AppResources>,
    headers: HeaderMap,
) -> Response {
    let config = &resources.config;
    TransportBridge::new(&config.transport, &config.base_url).consume(&headers)
}
