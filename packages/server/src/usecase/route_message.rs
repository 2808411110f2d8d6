//! UseCase: メッセージのルーティング（検証 → 永続化 → ファンアウト）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RouteMessageUseCase::execute() メソッド
//! - 本文検証、永続メンバーシップ検証、ストアへの追記、購読者全員への配信
//!
//! ### なぜこのテストが必要か
//! - 本システムの中核経路。検証・認可・永続化・配信の順序と副作用を保証する
//! - 送信者も new_message を受け取る（ack 代わり）仕様の確認
//! - 失敗時（検証・認可）にメッセージが永続化されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーが送信し、送信者を含む購読者全員へ配信される
//! - 異常系：空本文・非メンバー・ストア失敗
//! - エッジケース：購読せずに送信（永続メンバーなら成功、本人へは届かない）

use std::sync::Arc;

use crate::domain::{ChatStore, MessageContent, MessageRecord, RoomId, UserId};
use crate::infrastructure::dto::websocket::OutboundFrame;
use crate::infrastructure::registry::ConnectionRegistry;

use super::error::RouteMessageError;

/// メッセージルーティングのユースケース
///
/// 認可は永続メンバーシップに対して行う。ライブ購読は配信先の選定にだけ
/// 使われるため、購読していないメンバーも送信はできる（その場合、本人には
/// 配信されない）。
pub struct RouteMessageUseCase {
    /// Store（メンバーシップ照会とメッセージ永続化）
    store: Arc<dyn ChatStore>,
    /// ConnectionRegistry（配信先の購読セット）
    registry: Arc<ConnectionRegistry>,
}

impl RouteMessageUseCase {
    /// 新しい RouteMessageUseCase を作成
    pub fn new(store: Arc<dyn ChatStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender_id` - 送信者のユーザー ID
    /// * `sender_username` - new_message フレームに載せる送信者名
    /// * `room_id` - 宛先ルーム
    /// * `raw_content` - 受信したままの本文（ここで検証する）
    ///
    /// # Returns
    ///
    /// * `Ok((MessageRecord, usize))` - 永続化された行と配信できた接続数
    /// * `Err(RouteMessageError)` - 検証・認可・ストア失敗
    pub async fn execute(
        &self,
        sender_id: UserId,
        sender_username: &str,
        room_id: RoomId,
        raw_content: String,
    ) -> Result<(MessageRecord, usize), RouteMessageError> {
        // 1. 本文を検証（trim 後に空でない・上限以内）
        let content = MessageContent::new(raw_content)?;

        // 2. 永続メンバーシップを検証
        if !self.store.is_member(sender_id, room_id).await? {
            tracing::info!(%sender_id, %room_id, "Message refused: not a durable member");
            return Err(RouteMessageError::NotAuthorized);
        }

        // 3. 永続化（ID・タイムスタンプはストアが採番）
        let record = self
            .store
            .append_message(room_id, sender_id, &content)
            .await?;

        // 4. 購読者全員へ配信（送信者を含む。これが送信 ack を兼ねる）
        let frame = OutboundFrame::new_message(&record, sender_username).to_json();
        let delivered = self.registry.broadcast_to_room(room_id, &frame, None).await;

        tracing::debug!(
            %sender_id,
            %room_id,
            message_id = %record.id,
            delivered,
            "Message routed"
        );
        Ok((record, delivered))
    }
}
