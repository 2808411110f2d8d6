//! 接続レジストリ（プレゼンス + ルーム購読 + ファンアウト）
//!
//! ## 責務
//!
//! - プレゼンステーブル（user_id → 接続ハンドル）の管理
//! - ルーム購読セット（room_id → 購読中 user_id 集合）の管理
//! - 購読者への非ブロッキングなファンアウト送信
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`src/ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、フレーム送信に使用します。
//!
//! プレゼンスと購読は単一の `Mutex` で直列化されます。これがブロードキャストの
//! 「入場点」であり、ロック保持中のチャネル送信は非ブロッキングなので、
//! 1 ルーム内の配信順序は各受信者について入場順と一致します。ロックを保持
//! したまま `.await` する操作は存在しません（ソケット書き込みは各接続の
//! writer タスク側で行われる）。
//!
//! 同一ユーザーの再接続は last-connect-wins です。旧エントリの sink は
//! ここで破棄され、旧接続の writer タスクがチャネル閉塞で終了し、接続が
//! 閉じられます。購読は接続ライフタイムに紐づくため、置き換え時に旧接続の
//! 購読もクリアされます。
//!
//! 永続メンバーシップはここでは一切参照しません。ブロードキャストは現在の
//! 購読セットのみを対象とします（送信者の権限チェックは UseCase 層の責務）。

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use irori_shared::time::now_utc_millis;

use crate::domain::{RoomId, UserId};

/// 接続ごとの送信ハンドル
///
/// 受信側は UI 層の writer タスクが保持し、WebSocket へ書き出します。
pub type FrameSink = mpsc::UnboundedSender<String>;

/// 接続 ID
///
/// 接続の世代を区別するための識別子。切断時の compare-and-remove と、
/// 置き換え後の古いセッションからの操作（stale 検出）に使います。
pub type ConnectionId = Uuid;

/// レジストリ操作の失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 呼び出し元の接続が既に置き換え・切断されている
    #[error("connection is no longer current")]
    ConnectionGone,
}

/// プレゼンスエントリ（接続中ユーザー 1 人につき 1 つ）
struct PresenceEntry {
    conn_id: ConnectionId,
    username: String,
    sink: FrameSink,
    connected_at: i64,
}

/// Mutex 1 つで直列化される共有状態
#[derive(Default)]
struct RegistryState {
    /// user_id → プレゼンスエントリ
    connections: HashMap<UserId, PresenceEntry>,
    /// room_id → 現在ライブイベントを購読している user_id 集合
    subscriptions: HashMap<RoomId, HashSet<UserId>>,
}

impl RegistryState {
    /// 呼び出し元の接続がまだ現行か
    fn is_current(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        self.connections
            .get(&user_id)
            .is_some_and(|entry| entry.conn_id == conn_id)
    }

    /// ユーザーを全ルームの購読セットから外す（空になったセットは削除）
    fn clear_subscriptions_of(&mut self, user_id: UserId) {
        self.subscriptions.retain(|_, members| {
            members.remove(&user_id);
            !members.is_empty()
        });
    }

    /// プレゼンスと購読の両方からユーザーを取り除く
    fn purge(&mut self, user_id: UserId) -> Option<PresenceEntry> {
        let entry = self.connections.remove(&user_id);
        self.clear_subscriptions_of(user_id);
        entry
    }
}

/// 接続レジストリ
///
/// `main` で 1 つだけ生成し、`Arc` で必要な構成要素へ明示的に渡します
/// （グローバル変数にはしない）。
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// 接続を登録し、接続 ID を返す
    ///
    /// 同一ユーザーの既存接続があれば置き換える（last-connect-wins）。
    /// 旧接続の sink は破棄され（writer タスクが終了して接続が閉じる）、
    /// 旧接続の購読はクリアされる。
    pub async fn connect(&self, user_id: UserId, username: &str, sink: FrameSink) -> ConnectionId {
        let conn_id = Uuid::new_v4();
        let entry = PresenceEntry {
            conn_id,
            username: username.to_string(),
            sink,
            connected_at: now_utc_millis(),
        };

        let mut state = self.state.lock().await;
        if let Some(prior) = state.connections.insert(user_id, entry) {
            // 購読は接続ライフタイムに紐づく。残っているのは旧接続の分なのでクリア
            state.clear_subscriptions_of(user_id);
            tracing::info!(
                %user_id,
                prior_conn_id = %prior.conn_id,
                new_conn_id = %conn_id,
                "Replaced existing connection (last-connect-wins)"
            );
        } else {
            tracing::debug!(%user_id, %conn_id, "Registered connection");
        }

        conn_id
    }

    /// 接続を解除する（compare-and-remove、冪等）
    ///
    /// プレゼンスエントリが呼び出し元の接続を指している場合のみ取り除く。
    /// 置き換え済み・切断済みなら何もしない（新しい接続を誤って
    /// 追い出さないため）。解除時はすべてのルーム購読からも外れる。
    pub async fn disconnect(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        let mut state = self.state.lock().await;
        if !state.is_current(user_id, conn_id) {
            tracing::debug!(%user_id, %conn_id, "Disconnect skipped: entry already gone or replaced");
            return false;
        }

        if let Some(entry) = state.purge(user_id) {
            let session_ms = now_utc_millis() - entry.connected_at;
            tracing::info!(%user_id, %conn_id, session_ms, "Connection removed");
        }
        true
    }

    /// ルーム購読に加わる
    ///
    /// 永続メンバーシップの検証は呼び出し側（UseCase 層）が済ませていること。
    pub async fn join_room(
        &self,
        user_id: UserId,
        conn_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        if !state.is_current(user_id, conn_id) {
            return Err(RegistryError::ConnectionGone);
        }

        state.subscriptions.entry(room_id).or_default().insert(user_id);
        tracing::debug!(%user_id, %room_id, "Subscribed to room");
        Ok(())
    }

    /// ルーム購読から外れる（購読していなくても成功し、false を返す）
    pub async fn leave_room(
        &self,
        user_id: UserId,
        conn_id: ConnectionId,
        room_id: RoomId,
    ) -> Result<bool, RegistryError> {
        let mut state = self.state.lock().await;
        if !state.is_current(user_id, conn_id) {
            return Err(RegistryError::ConnectionGone);
        }

        let was_subscribed = state
            .subscriptions
            .get_mut(&room_id)
            .is_some_and(|members| members.remove(&user_id));
        if state
            .subscriptions
            .get(&room_id)
            .is_some_and(|members| members.is_empty())
        {
            state.subscriptions.remove(&room_id);
        }

        if was_subscribed {
            tracing::debug!(%user_id, %room_id, "Unsubscribed from room");
        }
        Ok(was_subscribed)
    }

    /// 本人の現行接続へ 1 フレーム送る（ack / error / pong 用）
    ///
    /// 接続が置き換え済みなら `ConnectionGone`。送信失敗（受信側 drop）は
    /// その場で切断扱いにする。
    pub async fn send_to(
        &self,
        user_id: UserId,
        conn_id: ConnectionId,
        frame: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock().await;
        if !state.is_current(user_id, conn_id) {
            return Err(RegistryError::ConnectionGone);
        }

        let entry = state
            .connections
            .get(&user_id)
            .ok_or(RegistryError::ConnectionGone)?;
        if entry.sink.send(frame.to_string()).is_err() {
            tracing::warn!(%user_id, "Send to own connection failed, cleaning up");
            state.purge(user_id);
            return Err(RegistryError::ConnectionGone);
        }
        Ok(())
    }

    /// ルームの現在の購読者へフレームをファンアウトする
    ///
    /// `exclude` に指定された購読者はスキップ。送信に失敗したターゲットは
    /// 全員への送信パスが終わったあとにまとめて切断処理される（1 人の失敗で
    /// 残りの配信を中断しない・走査中のセットを変更しない）。
    /// 配信できた接続数を返す。
    pub async fn broadcast_to_room(
        &self,
        room_id: RoomId,
        frame: &str,
        exclude: Option<UserId>,
    ) -> usize {
        let mut state = self.state.lock().await;

        let targets: Vec<UserId> = match state.subscriptions.get(&room_id) {
            Some(members) => members
                .iter()
                .copied()
                .filter(|user_id| Some(*user_id) != exclude)
                .collect(),
            None => return 0,
        };

        let mut delivered = 0;
        let mut dead: Vec<UserId> = Vec::new();
        for user_id in targets {
            match state.connections.get(&user_id) {
                Some(entry) => {
                    if entry.sink.send(frame.to_string()).is_err() {
                        tracing::warn!(%user_id, %room_id, "Broadcast target unreachable, scheduling cleanup");
                        dead.push(user_id);
                    } else {
                        delivered += 1;
                    }
                }
                // 購読者は必ずプレゼンスを持つ不変条件があるため通常は来ない
                None => dead.push(user_id),
            }
        }

        for user_id in dead {
            state.purge(user_id);
            tracing::info!(%user_id, "Removed dead broadcast target");
        }

        delivered
    }

    /// 接続中ユーザーのスナップショット（昇順ソート済み）
    pub async fn list_online(&self) -> Vec<UserId> {
        let state = self.state.lock().await;
        let mut online: Vec<UserId> = state.connections.keys().copied().collect();
        online.sort();
        online
    }

    /// ユーザーが接続中か
    pub async fn is_online(&self, user_id: UserId) -> bool {
        let state = self.state.lock().await;
        state.connections.contains_key(&user_id)
    }

    /// ルームの現在の購読者数（テスト・デバッグ用の観測点）
    pub async fn subscriber_count(&self, room_id: RoomId) -> usize {
        let state = self.state.lock().await;
        state
            .subscriptions
            .get(&room_id)
            .map_or(0, |members| members.len())
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
