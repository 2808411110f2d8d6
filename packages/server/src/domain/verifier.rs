//! IdentityVerifier trait 定義
//!
//! WebSocket ハンドシェイクと HTTP の Bearer 認証が消費する
//! 資格情報検証のインターフェース。実装（JWT）は Infrastructure 層。

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::{error::VerifyError, value_object::UserId};

/// 検証済みユーザーの同一性情報
///
/// 接続レジストリとフレーム構築が必要とする最小限のフィールドのみを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

/// Identity Verifier trait
///
/// Bearer 資格情報を検証し、検証済みの [`Identity`] か失敗理由を返す。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// 資格情報（アクセストークン）を検証する
    async fn verify(&self, credential: &str) -> Result<Identity, VerifyError>;
}
