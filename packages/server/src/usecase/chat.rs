//! UseCase: チャット CRUD（ダイレクト・グループ）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ChatUseCase の各操作（ダイレクト送信・履歴・一覧、グループ作成・
//!   送信・履歴・メンバー管理・一覧)
//! - ページングの正規化（limit 1..=100、デフォルト 50）
//! - グループの認可規則（追加は作成者のみ、削除は作成者または本人）
//!
//! ### なぜこのテストが必要か
//! - HTTP API の本体。認可規則の取り違えはそのまま情報漏えいになる
//! - 履歴の並び（新しい順で取得 → 反転して古い順で返す）と既読化の
//!   副作用を保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：ダイレクト送信、履歴取得と既読化、グループの一連の操作
//! - 異常系：自分宛て送信、不在ユーザー、非メンバー、作成者以外の追加
//! - エッジケース：limit の範囲外指定、未所属メンバーの削除

use std::sync::Arc;

use crate::domain::{
    ChatStore, DirectChatSummary, MessageContent, MessageRecord, MessageWithSender, Room, RoomId,
    RoomKind, UserId,
};

use super::error::ChatError;

/// 履歴ページングの正規化パラメータ
const HISTORY_DEFAULT_LIMIT: i64 = 50;
const HISTORY_MAX_LIMIT: i64 = 100;

/// グループ名の上限文字数
const GROUP_NAME_MAX_CHARS: usize = 100;

/// チャット CRUD のユースケース
///
/// WebSocket 経路（RouteMessageUseCase）とは独立した HTTP 用の操作群。
/// 永続化だけを行い、ライブ配信には関与しない。
pub struct ChatUseCase {
    /// Store（ルーム・メンバーシップ・メッセージの永続化）
    store: Arc<dyn ChatStore>,
}

impl ChatUseCase {
    /// 新しい ChatUseCase を作成
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self { store }
    }

    // --- direct chats ---

    /// ダイレクトメッセージ送信
    ///
    /// ペアの direct ルームを get-or-create してから追記する。
    pub async fn send_direct_message(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        raw_content: String,
    ) -> Result<MessageRecord, ChatError> {
        let content = MessageContent::new(raw_content)?;

        if self.store.user_by_id(recipient_id).await?.is_none() {
            return Err(ChatError::RecipientNotFound);
        }
        if sender_id == recipient_id {
            return Err(ChatError::SelfMessage);
        }

        let room = self
            .store
            .get_or_create_direct_room(sender_id, recipient_id)
            .await?;
        let record = self.store.append_message(room.id, sender_id, &content).await?;
        tracing::debug!(%sender_id, %recipient_id, room_id = %room.id, "Direct message stored");
        Ok(record)
    }

    /// ダイレクトチャット履歴（古い順のページ）
    ///
    /// 取得と同時に相手の送信分を既読にする。
    pub async fn direct_history(
        &self,
        user_id: UserId,
        other_user_id: UserId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MessageWithSender>, ChatError> {
        if self.store.user_by_id(other_user_id).await?.is_none() {
            return Err(ChatError::UserNotFound);
        }
        if user_id == other_user_id {
            return Err(ChatError::SelfMessage);
        }

        let room = self
            .store
            .get_or_create_direct_room(user_id, other_user_id)
            .await?;
        let (limit, offset) = page_params(limit, offset);
        let mut page = self.store.messages_for_room(room.id, limit, offset).await?;
        self.store.mark_messages_read(room.id, user_id).await?;

        // ストアは新しい順で返すので、ページ内は古い順に読めるよう反転する
        page.reverse();
        Ok(page)
    }

    /// ダイレクトチャット一覧（相手・最新メッセージ・未読数つき）
    pub async fn list_direct_chats(
        &self,
        user_id: UserId,
    ) -> Result<Vec<DirectChatSummary>, ChatError> {
        let rooms = self.store.rooms_of_user(user_id, RoomKind::Direct).await?;

        let mut summaries = Vec::with_capacity(rooms.len());
        for room in rooms {
            let members = self.store.room_members(room.id).await?;
            // direct ルームのメンバーは 2 人。相手が退会済みの部屋は飛ばす
            let Some(other) = members.into_iter().find(|m| m.id != user_id) else {
                continue;
            };
            let last = self.store.last_message(room.id).await?;
            let unread_count = self.store.unread_count(room.id, user_id).await?;
            summaries.push(DirectChatSummary {
                room_id: room.id,
                other_user_id: other.id,
                other_username: other.username,
                other_full_name: other.full_name,
                last_message: last.as_ref().map(|m| m.content.clone()),
                last_message_at: last.as_ref().map(|m| m.created_at),
                unread_count,
            });
        }
        Ok(summaries)
    }

    // --- group chats ---

    /// グループ作成（作成者は常にメンバーに含まれる）
    pub async fn create_group(
        &self,
        creator_id: UserId,
        name: String,
        member_ids: Vec<UserId>,
    ) -> Result<Room, ChatError> {
        if name.trim().is_empty() || name.chars().count() > GROUP_NAME_MAX_CHARS {
            return Err(ChatError::Validation(format!(
                "group name must be 1-{GROUP_NAME_MAX_CHARS} characters"
            )));
        }
        if member_ids.is_empty() {
            return Err(ChatError::Validation(
                "member_ids must not be empty".to_string(),
            ));
        }
        for user_id in &member_ids {
            if self.store.user_by_id(*user_id).await?.is_none() {
                return Err(ChatError::MemberNotFound(*user_id));
            }
        }

        let room = self
            .store
            .create_group_room(name, creator_id, member_ids)
            .await?;
        tracing::info!(room_id = %room.id, %creator_id, "Group created");
        Ok(room)
    }

    /// グループへのメッセージ送信
    pub async fn send_group_message(
        &self,
        sender_id: UserId,
        group_id: RoomId,
        raw_content: String,
    ) -> Result<MessageRecord, ChatError> {
        let content = MessageContent::new(raw_content)?;
        self.require_group(group_id).await?;
        if !self.store.is_member(sender_id, group_id).await? {
            return Err(ChatError::NotAMember);
        }

        let record = self
            .store
            .append_message(group_id, sender_id, &content)
            .await?;
        tracing::debug!(%sender_id, %group_id, "Group message stored");
        Ok(record)
    }

    /// グループ履歴（古い順のページ、既読化はしない）
    pub async fn group_history(
        &self,
        user_id: UserId,
        group_id: RoomId,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<MessageWithSender>, ChatError> {
        self.require_group(group_id).await?;
        if !self.store.is_member(user_id, group_id).await? {
            return Err(ChatError::NotAMember);
        }

        let (limit, offset) = page_params(limit, offset);
        let mut page = self.store.messages_for_room(group_id, limit, offset).await?;
        page.reverse();
        Ok(page)
    }

    /// グループへのメンバー追加（作成者のみ）
    ///
    /// 既存メンバーはスキップし、実際に追加した人数を返す。
    pub async fn add_group_members(
        &self,
        actor_id: UserId,
        group_id: RoomId,
        user_ids: Vec<UserId>,
    ) -> Result<u64, ChatError> {
        let room = self.require_group(group_id).await?;
        if room.created_by != Some(actor_id) {
            return Err(ChatError::NotCreator);
        }
        for user_id in &user_ids {
            if self.store.user_by_id(*user_id).await?.is_none() {
                return Err(ChatError::MemberNotFound(*user_id));
            }
        }

        let added = self.store.add_members(group_id, user_ids).await?;
        tracing::info!(%group_id, %actor_id, added, "Group members added");
        Ok(added)
    }

    /// グループからのメンバー削除（作成者は誰でも、本人は自分のみ）
    pub async fn remove_group_member(
        &self,
        actor_id: UserId,
        group_id: RoomId,
        member_id: UserId,
    ) -> Result<(), ChatError> {
        let room = self.require_group(group_id).await?;
        if room.created_by != Some(actor_id) && member_id != actor_id {
            return Err(ChatError::RemovalNotAllowed);
        }

        if !self.store.remove_member(group_id, member_id).await? {
            return Err(ChatError::MemberNotInGroup);
        }
        tracing::info!(%group_id, %actor_id, %member_id, "Group member removed");
        Ok(())
    }

    /// 所属グループ一覧
    pub async fn list_groups(&self, user_id: UserId) -> Result<Vec<Room>, ChatError> {
        Ok(self.store.rooms_of_user(user_id, RoomKind::Group).await?)
    }

    /// group ルームの存在と種別を確認する
    async fn require_group(&self, group_id: RoomId) -> Result<Room, ChatError> {
        let room = self
            .store
            .room_by_id(group_id)
            .await?
            .ok_or(ChatError::GroupNotFound)?;
        if room.kind != RoomKind::Group {
            return Err(ChatError::NotAGroup);
        }
        Ok(room)
    }
}

/// limit / offset を仕様の範囲（1..=100、デフォルト 50 / 0 以上）へ丸める
fn page_params(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    let limit = limit.unwrap_or(HISTORY_DEFAULT_LIMIT).clamp(1, HISTORY_MAX_LIMIT);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}
