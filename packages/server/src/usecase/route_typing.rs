//! UseCase: 入力中インジケータのルーティング
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RouteTypingUseCase::execute() メソッド
//! - 送信者を除く購読者への user_typing 配信
//!
//! ### なぜこのテストが必要か
//! - 送信者除外（自分の typing が自分に返らない）仕様の保証
//! - 永続化・認可を一切伴わないことの確認（ストアに触れない）
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数購読者のうち送信者以外へ配信
//! - エッジケース：送信者しか購読していない場合（配信ゼロ）

use std::sync::Arc;

use crate::domain::{RoomId, UserId};
use crate::infrastructure::dto::websocket::OutboundFrame;
use crate::infrastructure::registry::ConnectionRegistry;

/// 入力中インジケータのユースケース
///
/// 永続化も認可もしない。接続済みで購読しているユーザーにだけ意味のある
/// 一過性のイベントなので、ベストエフォートで配る。
pub struct RouteTypingUseCase {
    /// ConnectionRegistry（配信先の購読セット）
    registry: Arc<ConnectionRegistry>,
}

impl RouteTypingUseCase {
    /// 新しい RouteTypingUseCase を作成
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 入力中インジケータの配信を実行
    ///
    /// # Returns
    ///
    /// 配信できた接続数（失敗は存在しない）
    pub async fn execute(&self, user_id: UserId, username: &str, room_id: RoomId) -> usize {
        let frame = OutboundFrame::UserTyping {
            room_id,
            user_id,
            username: username.to_string(),
        }
        .to_json();

        let delivered = self
            .registry
            .broadcast_to_room(room_id, &frame, Some(user_id))
            .await;
        tracing::trace!(%user_id, %room_id, delivered, "Typing indicator routed");
        delivered
    }
}
