//! UseCase: 認証・アカウント操作
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthUseCase の各操作（register / login / refresh / logout /
//!   logout_all / change_password / profile）
//! - 入力検証、重複チェック、パスワード検証、リフレッシュトークンの
//!   保存とローテーション
//!
//! ### なぜこのテストが必要か
//! - 資格情報を扱う経路はエラーの出し分けがセキュリティ境界そのもの
//!   （ユーザー不在とパスワード不一致を区別しない等）
//! - リフレッシュトークンのローテーション（旧トークン削除 → 新ペア発行）
//!   が揃って行われることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：登録 → ログイン → リフレッシュ → ログアウトの一連
//! - 異常系：重複登録、パスワード不一致、無効化済みアカウント、
//!   アクセストークンでのリフレッシュ試行
//! - エッジケース：未知のリフレッシュトークンのログアウト（no-op）

use std::sync::Arc;

use crate::domain::{ChatStore, User, UserId, Username};
use crate::infrastructure::security::{
    self, TOKEN_TYPE_REFRESH, TokenError, TokenPair, TokenService,
};

use super::error::AuthError;

/// パスワードの許容文字数
const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 100;

/// 表示名の上限文字数
const FULL_NAME_MAX_CHARS: usize = 100;

/// 認証・アカウント操作のユースケース
pub struct AuthUseCase {
    /// Store（ユーザーとリフレッシュトークンの永続化）
    store: Arc<dyn ChatStore>,
    /// TokenService（JWT の発行・検証）
    tokens: Arc<TokenService>,
}

impl AuthUseCase {
    /// 新しい AuthUseCase を作成
    pub fn new(store: Arc<dyn ChatStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// ユーザー登録
    ///
    /// username / email の重複を拒否し、bcrypt ハッシュを保存して
    /// トークンペアを発行する。リフレッシュトークンはストアに残す。
    pub async fn register(
        &self,
        username: String,
        email: String,
        password: String,
        full_name: Option<String>,
    ) -> Result<(User, TokenPair), AuthError> {
        let username =
            Username::new(username).map_err(|e| AuthError::Validation(e.to_string()))?;
        validate_email(&email)?;
        validate_password(&password)?;
        if let Some(name) = &full_name {
            if name.chars().count() > FULL_NAME_MAX_CHARS {
                return Err(AuthError::Validation(format!(
                    "full name must be at most {FULL_NAME_MAX_CHARS} characters"
                )));
            }
        }

        if self.store.user_by_username(username.as_str()).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash =
            security::hash_password(&password).map_err(|e| AuthError::Hash(e.to_string()))?;
        let user = self
            .store
            .create_user(username, email, password_hash, full_name)
            .await?;

        let pair = self.issue_and_save_pair(user.id).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok((user, pair))
    }

    /// ログイン
    ///
    /// `username_or_email` はまずユーザー名として、次にメールアドレスとして
    /// 解決する。不在とパスワード不一致は同じエラーで返す。
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> Result<(User, TokenPair), AuthError> {
        let user = match self.store.user_by_username(username_or_email).await? {
            Some(user) => Some(user),
            None => self.store.user_by_email(username_or_email).await?,
        };
        let Some(user) = user else {
            return Err(AuthError::InvalidCredentials);
        };

        let verified = security::verify_password(password, &user.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !verified {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        let pair = self.issue_and_save_pair(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, pair))
    }

    /// リフレッシュトークンのローテーション
    ///
    /// 署名・種別・ストア上の存在を検証したうえで、旧トークンを削除して
    /// 新しいペアを発行する。
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.tokens.decode(refresh_token).map_err(|e| match e {
            TokenError::Expired => AuthError::RefreshTokenExpired,
            _ => AuthError::InvalidRefreshToken,
        })?;
        if claims.token_type != TOKEN_TYPE_REFRESH {
            return Err(AuthError::InvalidRefreshToken);
        }
        if self.store.refresh_token(refresh_token).await?.is_none() {
            // 署名は正しいが失効済み（ログアウト・ローテーション後の再利用）
            return Err(AuthError::InvalidRefreshToken);
        }

        let user_id = UserId(claims.sub);
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;
        if !user.is_active {
            return Err(AuthError::AccountInactive);
        }

        self.store.delete_refresh_token(refresh_token).await?;
        let pair = self.issue_and_save_pair(user_id).await?;
        tracing::debug!(%user_id, "Refresh token rotated");
        Ok(pair)
    }

    /// ログアウト（リフレッシュトークンを 1 件失効）
    ///
    /// 未知のトークンは no-op として成功扱い。
    pub async fn logout(&self, refresh_token: &str) -> Result<bool, AuthError> {
        let revoked = self.store.delete_refresh_token(refresh_token).await?;
        Ok(revoked)
    }

    /// 全デバイスからのログアウト（失効させた件数を返す）
    pub async fn logout_all(&self, user_id: UserId) -> Result<u64, AuthError> {
        let revoked = self.store.delete_refresh_tokens_for(user_id).await?;
        tracing::info!(%user_id, revoked, "Logged out from all devices");
        Ok(revoked)
    }

    /// パスワード変更
    ///
    /// 旧パスワードを検証し、新しいハッシュを保存したうえで全リフレッシュ
    /// トークンを失効させる（再ログインを強制する）。
    pub async fn change_password(
        &self,
        user_id: UserId,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let verified = security::verify_password(old_password, &user.password_hash)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        if !verified {
            return Err(AuthError::WrongPassword);
        }
        validate_password(new_password)?;

        let new_hash =
            security::hash_password(new_password).map_err(|e| AuthError::Hash(e.to_string()))?;
        self.store.update_password(user_id, new_hash).await?;
        let revoked = self.store.delete_refresh_tokens_for(user_id).await?;
        tracing::info!(%user_id, revoked, "Password changed, sessions revoked");
        Ok(())
    }

    /// 現在のユーザーのプロフィール
    pub async fn profile(&self, user_id: UserId) -> Result<User, AuthError> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)
    }

    /// トークンペアを発行し、リフレッシュトークンをストアに保存する
    async fn issue_and_save_pair(&self, user_id: UserId) -> Result<TokenPair, AuthError> {
        let pair = self.tokens.issue_pair(user_id)?;
        self.store
            .save_refresh_token(user_id, pair.refresh_token.clone(), pair.refresh_expires_at)
            .await?;
        Ok(pair)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let chars = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&chars) {
        return Err(AuthError::Validation(format!(
            "password must be {PASSWORD_MIN_CHARS}-{PASSWORD_MAX_CHARS} characters"
        )));
    }
    Ok(())
}

/// メールアドレスの形式チェック（厳密な RFC 検証はしない）
fn validate_email(email: &str) -> Result<(), AuthError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AuthError::Validation("invalid email address".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockChatStore;
    use chrono::{TimeZone, Utc};
    use irori_shared::time::FixedClock;
    use mockall::predicate::eq;

    const SECRET: &str = "test-secret";

    fn token_service() -> Arc<TokenService> {
        let millis = Utc
            .with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .unwrap()
            .timestamp_millis();
        Arc::new(TokenService::with_clock(
            SECRET,
            Arc::new(FixedClock::new(millis)),
        ))
    }

    fn test_user(id: i64, username: &str, password: &str, is_active: bool) -> User {
        User {
            id: UserId(id),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: security::hash_password(password).unwrap(),
            full_name: None,
            is_active,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_tokens_and_saves_refresh() {
        // テスト項目: 登録に成功するとユーザーとトークンペアが返り、
        // リフレッシュトークンがストアに保存される
        // given (前提条件):
        let mut store = MockChatStore::new();
        store.expect_user_by_username().returning(|_| Ok(None));
        store.expect_user_by_email().returning(|_| Ok(None));
        store
            .expect_create_user()
            .withf(|username, email, hash, full_name| {
                username.as_str() == "alice"
                    && email == "alice@example.com"
                    && hash.starts_with("$2")
                    && full_name.as_deref() == Some("Alice")
            })
            .returning(|username, email, password_hash, full_name| {
                Ok(User {
                    id: UserId(1),
                    username: username.into_string(),
                    email,
                    password_hash,
                    full_name,
                    is_active: true,
                    created_at: Utc::now(),
                })
            });
        store
            .expect_save_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase
            .register(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "password123".to_string(),
                Some("Alice".to_string()),
            )
            .await;

        // then (期待する結果):
        let (user, pair) = result.unwrap();
        assert_eq!(user.id, UserId(1));
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username() {
        // テスト項目: 既存ユーザー名での登録は UsernameTaken になる
        // given (前提条件):
        let mut store = MockChatStore::new();
        store
            .expect_user_by_username()
            .returning(|_| Ok(Some(test_user(1, "alice", "password123", true))));
        store.expect_create_user().never();
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase
            .register(
                "alice".to_string(),
                "new@example.com".to_string(),
                "password123".to_string(),
                None,
            )
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), AuthError::UsernameTaken);
    }

    #[tokio::test]
    async fn test_register_validates_before_touching_store() {
        // テスト項目: パスワードが短すぎる登録は検証で弾かれ、ストアには
        // 一切アクセスしない
        // given (前提条件):
        let mut store = MockChatStore::new();
        store.expect_user_by_username().never();
        store.expect_user_by_email().never();
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase
            .register(
                "alice".to_string(),
                "alice@example.com".to_string(),
                "short".to_string(),
                None,
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_email() {
        // テスト項目: @ やドメインの無いメールアドレスは拒否される
        // given (前提条件):
        let store = MockChatStore::new();
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        for bad in ["no-at-sign", "local@", "@domain.com", "a@nodot"] {
            let result = usecase
                .register(
                    "alice".to_string(),
                    bad.to_string(),
                    "password123".to_string(),
                    None,
                )
                .await;

            // then (期待する結果):
            assert!(
                matches!(result, Err(AuthError::Validation(_))),
                "accepted: {bad}"
            );
        }
    }

    #[tokio::test]
    async fn test_login_falls_back_to_email_lookup() {
        // テスト項目: ユーザー名で見つからない場合はメールアドレスで解決する
        // given (前提条件):
        let mut store = MockChatStore::new();
        store
            .expect_user_by_username()
            .with(eq("alice@example.com"))
            .returning(|_| Ok(None));
        store
            .expect_user_by_email()
            .with(eq("alice@example.com"))
            .returning(|_| Ok(Some(test_user(1, "alice", "password123", true))));
        store.expect_save_refresh_token().returning(|_, _, _| Ok(()));
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase.login("alice@example.com", "password123").await;

        // then (期待する結果):
        let (user, _pair) = result.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        // テスト項目: パスワード不一致は InvalidCredentials（不在と同じ文言）
        // given (前提条件):
        let mut store = MockChatStore::new();
        store
            .expect_user_by_username()
            .returning(|_| Ok(Some(test_user(1, "alice", "password123", true))));
        store.expect_save_refresh_token().never();
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase.login("alice", "wrong-password").await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_account() {
        // テスト項目: 無効化済みアカウントはパスワードが合っていても拒否される
        // given (前提条件):
        let mut store = MockChatStore::new();
        store
            .expect_user_by_username()
            .returning(|_| Ok(Some(test_user(1, "alice", "password123", false))));
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase.login("alice", "password123").await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), AuthError::AccountInactive);
    }

    #[tokio::test]
    async fn test_refresh_rotates_stored_token() {
        // テスト項目: リフレッシュで旧トークンが削除され、新しいペアが
        // 保存される（ローテーション）
        // given (前提条件):
        let tokens = token_service();
        let pair = tokens.issue_pair(UserId(1)).unwrap();
        let old_refresh = pair.refresh_token.clone();

        let mut store = MockChatStore::new();
        {
            let old_refresh = old_refresh.clone();
            store.expect_refresh_token().returning(move |token| {
                assert_eq!(token, old_refresh);
                Ok(Some(crate::domain::RefreshTokenRecord {
                    id: 1,
                    user_id: UserId(1),
                    token: token.to_string(),
                    expires_at: pair.refresh_expires_at,
                    created_at: Utc::now(),
                }))
            });
        }
        store
            .expect_user_by_id()
            .returning(|_| Ok(Some(test_user(1, "alice", "password123", true))));
        {
            let old_refresh = old_refresh.clone();
            store
                .expect_delete_refresh_token()
                .withf(move |token| token == old_refresh)
                .times(1)
                .returning(|_| Ok(true));
        }
        store
            .expect_save_refresh_token()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let usecase = AuthUseCase::new(Arc::new(store), tokens);

        // when (操作):
        let result = usecase.refresh(&old_refresh).await;

        // then (期待する結果): 新しいリフレッシュトークンは旧と別物
        let new_pair = result.unwrap();
        assert!(!new_pair.refresh_token.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        // テスト項目: アクセストークンでのリフレッシュは種別違いで拒否される
        // given (前提条件):
        let tokens = token_service();
        let pair = tokens.issue_pair(UserId(1)).unwrap();
        let mut store = MockChatStore::new();
        store.expect_refresh_token().never();
        let usecase = AuthUseCase::new(Arc::new(store), tokens);

        // when (操作):
        let result = usecase.refresh(&pair.access_token).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), AuthError::InvalidRefreshToken);
    }

    #[tokio::test]
    async fn test_refresh_rejects_revoked_token() {
        // テスト項目: 署名は正しいがストアに無いトークン（ログアウト済み）は
        // 拒否される
        // given (前提条件):
        let tokens = token_service();
        let pair = tokens.issue_pair(UserId(1)).unwrap();
        let mut store = MockChatStore::new();
        store.expect_refresh_token().returning(|_| Ok(None));
        store.expect_delete_refresh_token().never();
        let usecase = AuthUseCase::new(Arc::new(store), tokens);

        // when (操作):
        let result = usecase.refresh(&pair.refresh_token).await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), AuthError::InvalidRefreshToken);
    }

    #[tokio::test]
    async fn test_logout_unknown_token_is_noop() {
        // テスト項目: 未知のリフレッシュトークンのログアウトはエラーにならない
        // given (前提条件):
        let mut store = MockChatStore::new();
        store.expect_delete_refresh_token().returning(|_| Ok(false));
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase.logout("unknown-token").await;

        // then (期待する結果):
        assert!(!result.unwrap());
    }

    #[tokio::test]
    async fn test_change_password_revokes_all_sessions() {
        // テスト項目: パスワード変更でハッシュが更新され、全リフレッシュ
        // トークンが失効する
        // given (前提条件):
        let mut store = MockChatStore::new();
        store
            .expect_user_by_id()
            .returning(|_| Ok(Some(test_user(1, "alice", "old-password", true))));
        store
            .expect_update_password()
            .withf(|user_id, hash| *user_id == UserId(1) && hash.starts_with("$2"))
            .times(1)
            .returning(|_, _| Ok(()));
        store
            .expect_delete_refresh_tokens_for()
            .with(eq(UserId(1)))
            .times(1)
            .returning(|_| Ok(2));
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase
            .change_password(UserId(1), "old-password", "new-password-1")
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_rejects_wrong_old_password() {
        // テスト項目: 旧パスワード不一致では何も更新されない
        // given (前提条件):
        let mut store = MockChatStore::new();
        store
            .expect_user_by_id()
            .returning(|_| Ok(Some(test_user(1, "alice", "old-password", true))));
        store.expect_update_password().never();
        store.expect_delete_refresh_tokens_for().never();
        let usecase = AuthUseCase::new(Arc::new(store), token_service());

        // when (操作):
        let result = usecase
            .change_password(UserId(1), "not-the-password", "new-password-1")
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), AuthError::WrongPassword);
    }
}
