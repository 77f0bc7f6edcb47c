//! Session token minting for the wallet system.

use crate::error::SigningError;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Lifetime of every session token. Not configurable.
pub const SESSION_TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// A signed session token on its way to the browser.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    token: String,
    pub key_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl SessionToken {
    /// The compact JWS. Only the transport layer should need this.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn into_string(self) -> String {
        self.token
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("token", &"<redacted>")
            .field("key_id", &self.key_id)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Turn literal `\n` escapes into newlines. Keys stored in single-line
/// environment values arrive in that form.
pub fn normalize_pem(raw: &str) -> String {
    raw.trim().trim_matches('"').replace("\\n", "\n")
}

/// Sign a session token for `subject`, expiring one hour from now.
///
/// `key_id` is copied into the JWS header as a label for the relying party;
/// it is not used to select `private_key_pem`.
pub fn reissue(
    subject: &str,
    key_id: &str,
    private_key_pem: &str,
    audience: &str,
    issuer: &str,
) -> Result<SessionToken, SigningError> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    reissue_at(subject, key_id, private_key_pem, audience, issuer, now)
}

/// [`reissue`] with an explicit issuance time.
pub fn reissue_at(
    subject: &str,
    key_id: &str,
    private_key_pem: &str,
    audience: &str,
    issuer: &str,
    issued_at: i64,
) -> Result<SessionToken, SigningError> {
    let key = EncodingKey::from_rsa_pem(normalize_pem(private_key_pem).as_bytes())
        .map_err(|e| SigningError::InvalidKey(e.to_string()))?;

    let claims = SessionClaims {
        iss: issuer.to_string(),
        sub: subject.to_string(),
        aud: audience.to_string(),
        iat: issued_at,
        exp: issued_at + SESSION_TOKEN_TTL_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(key_id.to_string());

    let token = encode(&header, &claims, &key).map_err(|e| SigningError::Encode(e.to_string()))?;

    Ok(SessionToken {
        token,
        key_id: key_id.to_string(),
        issued_at: claims.iat,
        expires_at: claims.exp,
    })
}
