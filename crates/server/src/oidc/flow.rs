use crate::config::AppConfig;
use crate::error::AuthFlowError;
use crate::oidc::{IdTokenVerifier, SessionToken, TokenExchangeClient, reissue};
use std::sync::Arc;

/// Exchange → verify → reissue for one authorization code.
///
/// A session token is only minted from the identity returned by
/// [`IdTokenVerifier::verify`]; any earlier error returns before signing.
#[derive(Clone)]
pub struct LoginFlow {
    config: Arc<AppConfig>,
    exchange: TokenExchangeClient,
    verifier: IdTokenVerifier,
}

impl LoginFlow {
    pub fn new(
        config: Arc<AppConfig>,
        exchange: TokenExchangeClient,
        verifier: IdTokenVerifier,
    ) -> Self {
        Self {
            config,
            exchange,
            verifier,
        }
    }

    pub fn verifier(&self) -> &IdTokenVerifier {
        &self.verifier
    }

    #[tracing::instrument(skip_all)]
    pub async fn complete(&self, code: &str) -> Result<SessionToken, AuthFlowError> {
        if code.trim().is_empty() {
            return Err(AuthFlowError::MissingInput);
        }
        self.config.require()?;

        let id_token = self.exchange.exchange_code(code).await?;
        let identity = self.verifier.verify(&id_token, &self.config.oidc).await?;

        let token = reissue(
            &identity.subject,
            &identity.key_id,
            &self.config.signing.private_key,
            &self.config.wallet.client_id,
            &self.config.base_url,
        )?;

        tracing::info!(
            kid = %token.key_id,
            expires_at = token.expires_at,
            "issued wallet session token"
        );
        Ok(token)
    }
}
