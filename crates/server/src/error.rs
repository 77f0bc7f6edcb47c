use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

/// Failures while swapping an authorization code for an ID token.
#[derive(Debug, Error)]
pub enum TokenExchangeError {
    #[error("Authorization code is empty")]
    EmptyCode,
    /// `body` holds the provider's error payload. It is logged, never returned to the browser.
    #[error("Token endpoint rejected the code with HTTP {status}")]
    Rejected { status: StatusCode, body: String },
    #[error("Token response did not contain an id_token")]
    MissingIdToken,
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
    #[error("Token endpoint timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error talking to token endpoint: {0}")]
    Network(String),
}

/// Reasons an ID token is refused. Every variant is a hard stop.
#[derive(Debug, Error)]
pub enum InvalidTokenError {
    #[error("ID token is malformed: {0}")]
    Malformed(String),
    #[error("ID token header has no kid")]
    MissingKeyId,
    #[error("ID token uses unsupported algorithm {0}")]
    UnsupportedAlgorithm(String),
    #[error("No signing key with kid {0} in the provider key set")]
    UnknownKey(String),
    #[error("Provider key set unavailable: {0}")]
    KeySetUnavailable(String),
    #[error("ID token signature does not verify")]
    BadSignature,
    #[error("ID token issuer does not match")]
    IssuerMismatch,
    #[error("ID token audience does not match")]
    AudienceMismatch,
    #[error("ID token has expired")]
    Expired,
    #[error("ID token has no subject")]
    MissingSubject,
}

impl From<jsonwebtoken::errors::Error> for InvalidTokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::BadSignature,
            ErrorKind::InvalidIssuer => Self::IssuerMismatch,
            ErrorKind::InvalidAudience => Self::AudienceMismatch,
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => Self::MissingSubject,
            ErrorKind::InvalidAlgorithm => Self::UnsupportedAlgorithm(err.to_string()),
            _ => Self::Malformed(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("Private key is not a usable RSA PEM key: {0}")]
    InvalidKey(String),
    #[error("Failed to sign session token: {0}")]
    Encode(String),
}

/// Everything that can end a login attempt, mapped onto HTTP status codes.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("No code provided")]
    MissingInput,
    #[error("Required configuration value {0} is missing")]
    ConfigurationMissing(&'static str),
    #[error(transparent)]
    TokenExchange(#[from] TokenExchangeError),
    #[error(transparent)]
    InvalidToken(#[from] InvalidTokenError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error("Failed to read local document: {0}")]
    TransportRead(String),
}

impl AuthFlowError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthFlowError::MissingInput => StatusCode::BAD_REQUEST,
            AuthFlowError::TokenExchange(_) | AuthFlowError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthFlowError::ConfigurationMissing(_)
            | AuthFlowError::Signing(_)
            | AuthFlowError::TransportRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show a browser. Never contains provider or key details.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthFlowError::MissingInput => "No code provided",
            AuthFlowError::ConfigurationMissing(_) => "Server configuration incomplete",
            AuthFlowError::TokenExchange(_) | AuthFlowError::InvalidToken(_) => {
                "Authentication failed"
            }
            AuthFlowError::Signing(_) | AuthFlowError::TransportRead(_) => "Internal Server Error",
        }
    }
}

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AuthFlowError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.public_message().to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
