//! OpenID Connect login and session token re-issuance.
//!
//! The flow is strictly sequential, each step consuming the previous output:
//!
//! - [`exchange`] swaps the authorization code for the provider's ID token
//! - [`verify`] checks that token against the provider key set
//! - [`reissue`] mints the wallet session token for the verified subject
//!
//! [`LoginFlow`] strings the three together for the HTTP layer.

pub mod exchange;
pub mod flow;
pub mod reissue;
pub mod verify;

pub use exchange::TokenExchangeClient;
pub use flow::LoginFlow;
pub use reissue::{SESSION_TOKEN_TTL_SECS, SessionClaims, SessionToken, reissue};
pub use verify::{IdTokenVerifier, VerifiedIdentity};

/// OpenAPI tag for the login endpoints.
pub const AUTH_TAG: &str = "Authentication";
