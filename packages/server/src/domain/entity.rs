//! エンティティ定義
//!
//! データストアに永続化される行をそのまま写した構造体群。
//! ワイヤ形式（DTO）への変換は Infrastructure 層の `dto` モジュールが担います。

use chrono::{DateTime, Utc};

use super::value_object::{MessageId, RoomId, UserId};

/// 登録済みユーザー
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// ルーム種別（direct = 1 対 1 / group = グループ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum RoomKind {
    Direct,
    Group,
}

impl RoomKind {
    /// データベース・API 上の表記
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Direct => "direct",
            RoomKind::Group => "group",
        }
    }
}

/// チャットルーム
///
/// direct ルームは名前を持たず、参加者ペアごとに一意。
/// group ルームは名前を持ち、メンバーは後から追加・削除できる。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub id: RoomId,
    pub name: Option<String>,
    pub kind: RoomKind,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// 永続化されたメッセージ
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageRecord {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// メッセージ + 送信者名（履歴 API 用の読み取りモデル）
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MessageWithSender {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// 保存されたリフレッシュトークン
///
/// ログアウト・パスワード変更で失効させられるよう、発行済みの
/// リフレッシュトークンはストアに保存します。
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// ダイレクトチャット一覧の 1 エントリ
#[derive(Debug, Clone)]
pub struct DirectChatSummary {
    pub room_id: RoomId,
    pub other_user_id: UserId,
    pub other_username: String,
    pub other_full_name: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
}
