//! ドメイン層のエラー定義

use thiserror::Error;

/// データストア操作の失敗
///
/// ドライバ固有のエラー型に依存しないよう、バックエンド起因の失敗は
/// 文字列化して保持します（変換は Infrastructure 層で行う）。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(String),
}

/// 資格情報の検証失敗（接続・リクエストの拒否理由）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    /// 署名不正・壊れたトークンなど
    #[error("invalid credential")]
    InvalidToken,
    /// 有効期限切れ
    #[error("credential expired")]
    Expired,
    /// アクセストークンが要る場所にリフレッシュトークンが来た等
    #[error("wrong token type")]
    WrongTokenType,
    /// トークンは正当だが対応するユーザーがいない、または無効化済み
    #[error("unknown or inactive user")]
    UnknownUser,
    #[error("store backend error: {0}")]
    Store(String),
}

impl From<StoreError> for VerifyError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

/// メッセージ本文のバリデーション失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentError {
    #[error("message content must not be empty")]
    Empty,
    #[error("message content must be at most {max} characters")]
    TooLong { max: usize },
}

/// ユーザー名のバリデーション失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("username must be {min}-{max} characters")]
    InvalidLength { min: usize, max: usize },
}
