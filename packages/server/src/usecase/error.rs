//! UseCase 層のエラー定義
//!
//! 各ユースケースが返すエラー型。UI 層が HTTP ステータス（400 / 401 /
//! 403 / 404 / 500）や WebSocket の `error` フレームへ変換します。

use thiserror::Error;

use crate::domain::{ContentError, StoreError, UserId};
use crate::infrastructure::registry::RegistryError;
use crate::infrastructure::security::TokenError;

/// 認証・アカウント操作の失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// 入力値の形式不正（文字数・メール形式など）
    #[error("{0}")]
    Validation(String),
    #[error("username already taken")]
    UsernameTaken,
    #[error("email already registered")]
    EmailTaken,
    /// ユーザー不在とパスワード不一致は区別せず同じ文言で返す
    #[error("invalid username/email or password")]
    InvalidCredentials,
    #[error("account is deactivated")]
    AccountInactive,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    RefreshTokenExpired,
    #[error("current password is incorrect")]
    WrongPassword,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// チャット CRUD 操作の失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Content(#[from] ContentError),
    /// グループ名や member_ids の形式不正
    #[error("{0}")]
    Validation(String),
    #[error("recipient user not found")]
    RecipientNotFound,
    #[error("cannot message yourself")]
    SelfMessage,
    #[error("user not found")]
    UserNotFound,
    #[error("user with id {0} not found")]
    MemberNotFound(UserId),
    #[error("group not found")]
    GroupNotFound,
    #[error("this is not a group chat")]
    NotAGroup,
    #[error("you are not a member of this group")]
    NotAMember,
    #[error("only the group creator can add members")]
    NotCreator,
    #[error("not authorized to remove this member")]
    RemovalNotAllowed,
    #[error("member not found in group")]
    MemberNotInGroup,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// ルーム購読参加の失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinRoomError {
    /// 永続メンバーシップが無い
    #[error("access denied to this room")]
    NotAuthorized,
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// ルーム購読離脱の失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaveRoomError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// メッセージ送信（ルーティング）の失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteMessageError {
    #[error(transparent)]
    Content(#[from] ContentError),
    /// 永続メンバーシップが無い
    #[error("access denied to this room")]
    NotAuthorized,
    #[error(transparent)]
    Store(#[from] StoreError),
}
