//! JWT issuing and decoding.
//!
//! Both token types are HS256 JWTs signed with the server secret. Expiry is
//! checked against an injected [`Clock`] rather than the library's own
//! system-time check, so expiry behavior is testable with a fixed clock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use irori_shared::time::{Clock, SystemClock};

use crate::domain::UserId;

/// Access-token lifetime in minutes.
const ACCESS_TOKEN_TTL_MINS: i64 = 30;

/// Refresh-token lifetime in days.
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

/// Claims carried by both token types.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// `"access"` or `"refresh"`.
    pub token_type: String,
}

/// Access + refresh token issued together.
///
/// `refresh_expires_at` mirrors the refresh token's embedded expiry; the
/// store persists it next to the token so revocation sweeps can drop
/// expired rows without decoding them.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token encoding failed: {0}")]
    Encode(String),
    #[error("invalid token")]
    Invalid,
    #[error("token expired")]
    Expired,
}

/// Issues and decodes the server's JWTs.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self::with_clock(secret, Arc::new(SystemClock))
    }

    pub fn with_clock(secret: &str, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            clock,
        }
    }

    /// Issue an access + refresh token pair for a user.
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, TokenError> {
        let now = DateTime::from_timestamp_millis(self.clock.now_utc_millis())
            .ok_or_else(|| TokenError::Encode("clock out of range".to_string()))?;
        let access_expires_at = now + Duration::minutes(ACCESS_TOKEN_TTL_MINS);
        let refresh_expires_at = now + Duration::days(REFRESH_TOKEN_TTL_DAYS);

        let access_token =
            self.issue(user_id, TOKEN_TYPE_ACCESS, access_expires_at.timestamp())?;
        let refresh_token =
            self.issue(user_id, TOKEN_TYPE_REFRESH, refresh_expires_at.timestamp())?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_expires_at,
        })
    }

    fn issue(&self, user_id: UserId, token_type: &str, exp: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.value(),
            exp,
            token_type: token_type.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Decode and validate a token's signature and expiry.
    ///
    /// The caller is responsible for checking `token_type`.
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        // Expiry is checked below against the injected clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;

        if data.claims.exp * 1000 <= self.clock.now_utc_millis() {
            return Err(TokenError::Expired);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use irori_shared::time::FixedClock;

    const SECRET: &str = "test-secret";

    fn service_at(millis: i64) -> TokenService {
        TokenService::with_clock(SECRET, Arc::new(FixedClock::new(millis)))
    }

    #[test]
    fn test_issue_and_decode_access_token() {
        // テスト項目: 発行したアクセストークンがデコードでき、クレームが一致する
        // given (前提条件):
        let service = service_at(1_000_000);

        // when (操作):
        let pair = service.issue_pair(UserId(42)).unwrap();
        let claims = service.decode(&pair.access_token).unwrap();

        // then (期待する結果):
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.token_type, TOKEN_TYPE_ACCESS);
    }

    #[test]
    fn test_access_token_expires_after_thirty_minutes() {
        // テスト項目: 発行から 30 分を超えたアクセストークンは Expired になる
        // given (前提条件): t=0 で発行し、31 分後のクロックで検証する
        let issuer = service_at(0);
        let pair = issuer.issue_pair(UserId(1)).unwrap();
        let later = service_at(31 * 60 * 1000);

        // when (操作):
        let result = later.decode(&pair.access_token);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        // テスト項目: アクセストークン失効後もリフレッシュトークンは有効
        // given (前提条件):
        let issuer = service_at(0);
        let pair = issuer.issue_pair(UserId(1)).unwrap();
        let later = service_at(31 * 60 * 1000);

        // when (操作):
        let claims = later.decode(&pair.refresh_token).unwrap();

        // then (期待する結果):
        assert_eq!(claims.token_type, TOKEN_TYPE_REFRESH);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        // テスト項目: JWT 形式でない文字列は Invalid になる
        // given (前提条件):
        let service = service_at(0);

        // when (操作):
        let result = service.decode("definitely-not-a-jwt");

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_decode_rejects_token_signed_with_other_secret() {
        // テスト項目: 署名鍵が異なるトークンは Invalid になる
        // given (前提条件):
        let issuer = TokenService::with_clock("other-secret", Arc::new(FixedClock::new(0)));
        let pair = issuer.issue_pair(UserId(1)).unwrap();
        let service = service_at(0);

        // when (操作):
        let result = service.decode(&pair.access_token);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), TokenError::Invalid);
    }
}
