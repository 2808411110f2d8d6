//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{Identity, UserId, VerifyError},
    infrastructure::dto::websocket::{InboundFrame, OutboundFrame},
    infrastructure::registry::ConnectionId,
    ui::state::AppState,
    usecase::{JoinRoomError, LeaveRoomError, RouteMessageError},
};

/// ハンドシェイク失敗時のクローズコード
///
/// 資格情報の検証に失敗した接続は、アプリケーションフレームを一切
/// 交換せずにこのコードで閉じる。
const AUTH_FAILURE_CLOSE_CODE: u16 = 4001;

/// WebSocket エンドポイント（`GET /ws/{token}`）
///
/// アクセストークンは URI に埋め込まれる。検証はアップグレード前に
/// 済ませ、失敗した接続はアップグレード直後にコード 4001 で閉じる
/// （HTTP ステータスではなくクローズコードで伝えるのがこのプロトコルの
/// 契約）。
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let verified = state.verifier.verify(&token).await;
    ws.on_upgrade(move |socket| handle_socket(socket, state, verified))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// This is the only place the socket is written to after the handshake:
/// the registry enqueues serialized frames into `rx` (non-blocking), and
/// this task drains them in order. A write error ends the task, which in
/// turn ends the session via the `select!` in [`handle_socket`].
fn writer_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    verified: Result<Identity, VerifyError>,
) {
    // 1. ハンドシェイク結果の確定。失敗ならコード 4001 で即クローズ
    let identity = match verified {
        Ok(identity) => identity,
        Err(e) => {
            tracing::info!("WebSocket handshake refused: {}", e);
            let mut socket = socket;
            let close = Message::Close(Some(CloseFrame {
                code: AUTH_FAILURE_CLOSE_CODE,
                reason: "authentication failed".into(),
            }));
            let _ = socket.send(close).await;
            return;
        }
    };

    let (mut sender, mut receiver) = socket.split();

    // 2. プレゼンス登録（同一ユーザーの旧接続は置き換えられる）
    let (tx, rx) = mpsc::unbounded_channel();
    let conn_id = state
        .registry
        .connect(identity.user_id, &identity.username, tx)
        .await;
    tracing::info!(
        user_id = %identity.user_id,
        username = %identity.username,
        %conn_id,
        "WebSocket connected"
    );

    // 3. セッション最初のフレームとして connected を送る
    let greeting = OutboundFrame::Connected {
        user_id: identity.user_id,
        username: identity.username.clone(),
    }
    .to_json();
    if sender.send(Message::Text(greeting.into())).await.is_err() {
        tracing::warn!(user_id = %identity.user_id, "Failed to send connected frame");
        state.registry.disconnect(identity.user_id, conn_id).await;
        return;
    }

    // 4. 送信側: レジストリからのフレームをソケットへ流す writer タスク
    let mut send_task = writer_loop(rx, sender);

    // 5. 受信側: クライアントのフレームをディスパッチするタスク
    let recv_state = state.clone();
    let recv_identity = identity.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!(user_id = %recv_identity.user_id, "WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_frame(&recv_state, &recv_identity, conn_id, &text).await;
                }
                Message::Ping(_) => {
                    // トランスポートレベルの ping/pong は axum が応答する
                    tracing::trace!(user_id = %recv_identity.user_id, "Received transport ping");
                }
                Message::Close(_) => {
                    tracing::info!(user_id = %recv_identity.user_id, "Client requested close");
                    break;
                }
                _ => {}
            }
        }
    });

    // どちらかのタスクが終わったら相方を止めてセッションを畳む
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // 6. compare-and-remove。置き換え済みの接続なら何もしない
    let removed = state.registry.disconnect(identity.user_id, conn_id).await;
    tracing::info!(
        user_id = %identity.user_id,
        %conn_id,
        removed,
        "WebSocket session ended"
    );
}

/// 受信フレーム 1 件のディスパッチ
///
/// パース失敗と未知の `type` は error フレームで応答し、接続は維持する。
/// 接続が既に置き換えられていた場合（Registry エラー）は応答先が無いので
/// ログだけ残す。
async fn dispatch_frame(
    state: &Arc<AppState>,
    identity: &Identity,
    conn_id: ConnectionId,
    raw: &str,
) {
    let frame = match serde_json::from_str::<InboundFrame>(raw) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(user_id = %identity.user_id, "Malformed frame: {}", e);
            send_error(state, identity.user_id, conn_id, "malformed frame").await;
            return;
        }
    };

    match frame {
        InboundFrame::JoinRoom { room_id } => {
            match state
                .join_room_usecase
                .execute(identity.user_id, conn_id, &identity.username, room_id)
                .await
            {
                Ok(()) => {}
                Err(JoinRoomError::Registry(e)) => {
                    tracing::debug!(user_id = %identity.user_id, %room_id, "Join ignored: {}", e);
                }
                Err(JoinRoomError::Store(e)) => {
                    tracing::error!(user_id = %identity.user_id, %room_id, "Join failed: {}", e);
                    send_error(state, identity.user_id, conn_id, "internal server error").await;
                }
                Err(e @ JoinRoomError::NotAuthorized) => {
                    send_error(state, identity.user_id, conn_id, &e.to_string()).await;
                }
            }
        }
        InboundFrame::LeaveRoom { room_id } => {
            if let Err(LeaveRoomError::Registry(e)) = state
                .leave_room_usecase
                .execute(identity.user_id, conn_id, &identity.username, room_id)
                .await
            {
                tracing::debug!(user_id = %identity.user_id, %room_id, "Leave ignored: {}", e);
            }
        }
        InboundFrame::Message { room_id, content } => {
            match state
                .route_message_usecase
                .execute(identity.user_id, &identity.username, room_id, content)
                .await
            {
                Ok(_) => {}
                Err(RouteMessageError::Store(e)) => {
                    tracing::error!(
                        user_id = %identity.user_id,
                        %room_id,
                        "Message persistence failed: {}",
                        e
                    );
                    send_error(state, identity.user_id, conn_id, "internal server error").await;
                }
                Err(e) => {
                    send_error(state, identity.user_id, conn_id, &e.to_string()).await;
                }
            }
        }
        InboundFrame::Typing { room_id } => {
            state
                .route_typing_usecase
                .execute(identity.user_id, &identity.username, room_id)
                .await;
        }
        InboundFrame::Ping => {
            let pong = OutboundFrame::Pong.to_json();
            if state
                .registry
                .send_to(identity.user_id, conn_id, &pong)
                .await
                .is_err()
            {
                tracing::debug!(user_id = %identity.user_id, "Pong undeliverable");
            }
        }
        InboundFrame::Unknown => {
            send_error(state, identity.user_id, conn_id, "unsupported frame type").await;
        }
    }
}

/// 本人の現行接続へ error フレームを送る（届かなければログのみ）
async fn send_error(state: &Arc<AppState>, user_id: UserId, conn_id: ConnectionId, message: &str) {
    let frame = OutboundFrame::Error {
        message: message.to_string(),
    }
    .to_json();
    if state.registry.send_to(user_id, conn_id, &frame).await.is_err() {
        tracing::debug!(%user_id, "Error frame undeliverable, connection replaced or gone");
    }
}
