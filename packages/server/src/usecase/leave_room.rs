//! UseCase: ルーム購読からの離脱
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - LeaveRoomUseCase::execute() メソッド
//! - 購読解除、本人への ack、残った購読者への user_left 通知
//!
//! ### なぜこのテストが必要か
//! - 離脱は常に成功する（購読していなくても冪等）仕様の保証
//! - 通知が残りの購読者だけに届くことを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：購読中のユーザーが離脱し、残りへ通知される
//! - エッジケース：購読していないルームからの離脱（ack は返る）

use std::sync::Arc;

use crate::domain::{RoomId, UserId};
use crate::infrastructure::dto::websocket::OutboundFrame;
use crate::infrastructure::registry::{ConnectionId, ConnectionRegistry};

use super::error::LeaveRoomError;

/// ルーム購読離脱のユースケース
///
/// 認可は不要（購読していないルームからの離脱も成功として扱う）。
pub struct LeaveRoomUseCase {
    /// ConnectionRegistry（プレゼンスと購読の管理）
    registry: Arc<ConnectionRegistry>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// ルーム購読離脱を実行
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - 実際に購読していたか
    /// * `Err(LeaveRoomError)` - 接続が現行でない
    pub async fn execute(
        &self,
        user_id: UserId,
        conn_id: ConnectionId,
        username: &str,
        room_id: RoomId,
    ) -> Result<bool, LeaveRoomError> {
        // 1. 購読セットから除去（購読していなければ false）
        let was_subscribed = self.registry.leave_room(user_id, conn_id, room_id).await?;

        // 2. 本人へ ack
        let ack = OutboundFrame::RoomLeft { room_id }.to_json();
        self.registry.send_to(user_id, conn_id, &ack).await?;

        // 3. 残った購読者へ通知（本人は既にセットに居ない）
        let notice = OutboundFrame::UserLeft {
            room_id,
            user_id,
            username: username.to_string(),
        }
        .to_json();
        let notified = self
            .registry
            .broadcast_to_room(room_id, &notice, Some(user_id))
            .await;

        tracing::debug!(%user_id, %room_id, was_subscribed, notified, "User left room");
        Ok(was_subscribed)
    }
}
