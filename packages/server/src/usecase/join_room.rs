//! UseCase: ルーム購読への参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 永続メンバーシップ検証、購読登録、本人への ack、他購読者への通知
//!
//! ### なぜこのテストが必要か
//! - 認可の検証：メンバーでないユーザーが購読に入れないことを保証
//! - 失敗時に購読セットが変化しない（状態を汚さない）ことを確認
//! - 通知の宛先選定（本人は ack、他者は user_joined）を保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：メンバーが参加し、既存購読者へ通知される
//! - 異常系：非メンバーの参加拒否、置き換え済み接続からの参加
//! - エッジケース：最初の購読者（通知対象ゼロ）

use std::sync::Arc;

use crate::domain::{ChatStore, RoomId, UserId};
use crate::infrastructure::dto::websocket::OutboundFrame;
use crate::infrastructure::registry::{ConnectionId, ConnectionRegistry};

use super::error::JoinRoomError;

/// ルーム購読参加のユースケース
///
/// 参加できるのは永続メンバーのみ。購読は接続ライフタイムに紐づくため、
/// 接続 ID が現行でなければ失敗する。
pub struct JoinRoomUseCase {
    /// Store（永続メンバーシップの照会先）
    store: Arc<dyn ChatStore>,
    /// ConnectionRegistry（プレゼンスと購読の管理）
    registry: Arc<ConnectionRegistry>,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(store: Arc<dyn ChatStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// ルーム購読参加を実行
    ///
    /// # Arguments
    ///
    /// * `user_id` - 参加するユーザーの ID
    /// * `conn_id` - 呼び出し元の接続 ID（stale 検出用）
    /// * `username` - 通知フレームに載せるユーザー名
    /// * `room_id` - 参加先ルーム
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 購読に入り、ack と通知を送信済み
    /// * `Err(JoinRoomError)` - 非メンバー・接続消失・ストア失敗
    pub async fn execute(
        &self,
        user_id: UserId,
        conn_id: ConnectionId,
        username: &str,
        room_id: RoomId,
    ) -> Result<(), JoinRoomError> {
        // 1. 永続メンバーシップを検証（購読セットは変更しない）
        if !self.store.is_member(user_id, room_id).await? {
            tracing::info!(%user_id, %room_id, "Join refused: not a durable member");
            return Err(JoinRoomError::NotAuthorized);
        }

        // 2. 購読セットへ追加
        self.registry.join_room(user_id, conn_id, room_id).await?;

        // 3. 本人へ ack
        let ack = OutboundFrame::RoomJoined { room_id }.to_json();
        self.registry.send_to(user_id, conn_id, &ack).await?;

        // 4. 既存購読者へ通知（本人は除く）
        let notice = OutboundFrame::UserJoined {
            room_id,
            user_id,
            username: username.to_string(),
        }
        .to_json();
        let notified = self
            .registry
            .broadcast_to_room(room_id, &notice, Some(user_id))
            .await;

        tracing::debug!(%user_id, %room_id, notified, "User joined room");
        Ok(())
    }
}
