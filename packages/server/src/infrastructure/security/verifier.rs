//! JWT-backed implementation of the domain [`IdentityVerifier`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ChatStore, Identity, IdentityVerifier, UserId, VerifyError};
use crate::infrastructure::security::token::{TOKEN_TYPE_ACCESS, TokenError, TokenService};

/// Resolves a bearer credential to a live identity.
///
/// Decoding proves the token was signed by this server and has not
/// expired; the store lookup proves the subject still exists and is
/// active. Deactivated and deleted users fail verification the same way,
/// so a caller cannot distinguish the two.
pub struct JwtIdentityVerifier {
    tokens: Arc<TokenService>,
    store: Arc<dyn ChatStore>,
}

impl JwtIdentityVerifier {
    pub fn new(tokens: Arc<TokenService>, store: Arc<dyn ChatStore>) -> Self {
        Self { tokens, store }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, VerifyError> {
        let claims = self.tokens.decode(credential).map_err(|e| match e {
            TokenError::Expired => VerifyError::Expired,
            _ => VerifyError::InvalidToken,
        })?;

        if claims.token_type != TOKEN_TYPE_ACCESS {
            return Err(VerifyError::WrongTokenType);
        }

        let user = self
            .store
            .user_by_id(UserId(claims.sub))
            .await?
            .ok_or(VerifyError::UnknownUser)?;
        if !user.is_active {
            return Err(VerifyError::UnknownUser);
        }

        Ok(Identity {
            user_id: user.id,
            username: user.username,
        })
    }
}
