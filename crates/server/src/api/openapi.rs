//! OpenAPI/Utoipa configuration.

use crate::api::{health::MISC_TAG, jwks::KEYS_TAG};
use crate::oidc::AUTH_TAG;
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "OIDC Wallet Bridge API",
        version = "1.0.0",
        description = "Signs in with an OpenID Connect provider and re-issues the verified identity as a wallet session token."
    ),
    tags(
        (name = AUTH_TAG, description = "Login flow and session token pickup"),
        (name = KEYS_TAG, description = "Public keys for session token verification"),
        (name = MISC_TAG, description = "Miscellaneous endpoints")
    )
)]
pub struct ApiDoc;
