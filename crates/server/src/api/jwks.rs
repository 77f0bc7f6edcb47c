//! Publication of this service's public signing keys.

use crate::AppResources;
use crate::error::{AuthFlowError, ErrorBody};
use crate::security::SecureJsonParser;
use axum::{
    Extension, Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// Tag for OpenAPI documentation.
pub const KEYS_TAG: &str = "Keys";

/// Serve the configured JWKS document.
#[tracing::instrument(skip_all)]
#[utoipa::path(
    get,
    path = "/.well-known/jwks.json",
    tag = KEYS_TAG,
    operation_id = "Get JWKS",
    summary = "Public keys for session tokens",
    description = "Returns the JSON Web Key Set relying parties use to verify session tokens issued by this \
                   service. The document is read from `signing.jwks_path` and may be cached for an hour.",
    responses(
        (status = 200, description = "JWKS document", content_type = "application/json"),
        (status = 500, description = "Key document unreadable", body = ErrorBody, content_type = "application/json")
    )
)]
pub async fn jwks(Extension(resources): Extension<AppResources>) -> Response {
    let path = &resources.config.signing.jwks_path;

    let document = match tokio::fs::read(path).await {
        Ok(bytes) => SecureJsonParser::default()
            .parse_value(&bytes)
            .map_err(|e| AuthFlowError::TransportRead(e.to_string())),
        Err(e) => Err(AuthFlowError::TransportRead(e.to_string())),
    };

    match document {
        Ok(document) => (
            StatusCode::OK,
            [(header::CACHE_CONTROL, "public, max-age=3600")],
            Json(document),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Error reading JWKS file");
            e.into_response()
        }
    }
}
