//! ChatStore trait 定義
//!
//! ドメイン層が必要とする永続データアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[cfg(test)]
use mockall::automock;

use super::{
    entity::{MessageRecord, MessageWithSender, RefreshTokenRecord, Room, RoomKind, User},
    error::StoreError,
    value_object::{MessageContent, RoomId, UserId, Username},
};

/// Chat Store trait
///
/// ユーザー・ルーム・永続メンバーシップ・メッセージ・リフレッシュトークンの
/// CRUD を提供するインターフェース。UseCase 層はこの trait に依存し、
/// Infrastructure 層の具体的な実装（SQLite 等）には依存しない。
///
/// 接続レジストリが参照するのは `is_member` / `append_message` のみで、
/// 残りは HTTP API の CRUD が使用する。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ChatStore: Send + Sync {
    // --- users ---

    /// ユーザーを新規作成（username / email は一意）
    async fn create_user(
        &self,
        username: Username,
        email: String,
        password_hash: String,
        full_name: Option<String>,
    ) -> Result<User, StoreError>;

    /// ID でユーザーを取得
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// ユーザー名でユーザーを取得
    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// メールアドレスでユーザーを取得
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// パスワードハッシュを更新
    async fn update_password(&self, id: UserId, password_hash: String) -> Result<(), StoreError>;

    // --- refresh tokens ---

    /// リフレッシュトークンを保存
    async fn save_refresh_token(
        &self,
        user_id: UserId,
        token: String,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// 保存済みリフレッシュトークンを取得
    async fn refresh_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// リフレッシュトークンを 1 件削除（存在した場合 true）
    async fn delete_refresh_token(&self, token: &str) -> Result<bool, StoreError>;

    /// ユーザーの全リフレッシュトークンを削除（削除件数を返す）
    async fn delete_refresh_tokens_for(&self, user_id: UserId) -> Result<u64, StoreError>;

    // --- rooms & durable membership ---

    /// ID でルームを取得
    async fn room_by_id(&self, id: RoomId) -> Result<Option<Room>, StoreError>;

    /// 2 ユーザー間の direct ルームを取得、無ければ作成
    async fn get_or_create_direct_room(&self, a: UserId, b: UserId) -> Result<Room, StoreError>;

    /// group ルームを作成（作成者は必ずメンバーに含める）
    async fn create_group_room(
        &self,
        name: String,
        creator: UserId,
        members: Vec<UserId>,
    ) -> Result<Room, StoreError>;

    /// 永続メンバーシップの有無
    async fn is_member(&self, user_id: UserId, room_id: RoomId) -> Result<bool, StoreError>;

    /// メンバーを追加（既存メンバーはスキップ、追加した人数を返す）
    async fn add_members(&self, room_id: RoomId, user_ids: Vec<UserId>) -> Result<u64, StoreError>;

    /// メンバーを 1 人削除（存在した場合 true）
    async fn remove_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, StoreError>;

    /// ルームのメンバー一覧
    async fn room_members(&self, room_id: RoomId) -> Result<Vec<User>, StoreError>;

    /// ユーザーが属する指定種別のルーム一覧
    async fn rooms_of_user(&self, user_id: UserId, kind: RoomKind) -> Result<Vec<Room>, StoreError>;

    // --- messages ---

    /// メッセージを追記し、採番済みの行を返す
    async fn append_message(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        content: &MessageContent,
    ) -> Result<MessageRecord, StoreError>;

    /// ルームのメッセージをページ取得（新しい順に limit/offset、呼び出し側で反転）
    async fn messages_for_room(
        &self,
        room_id: RoomId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MessageWithSender>, StoreError>;

    /// 自分以外が送ったメッセージを既読にする（更新件数を返す）
    async fn mark_messages_read(&self, room_id: RoomId, reader: UserId) -> Result<u64, StoreError>;

    /// 自分以外が送った未読メッセージ数
    async fn unread_count(&self, room_id: RoomId, reader: UserId) -> Result<i64, StoreError>;

    /// ルームの最新メッセージ
    async fn last_message(&self, room_id: RoomId) -> Result<Option<MessageRecord>, StoreError>;
}
