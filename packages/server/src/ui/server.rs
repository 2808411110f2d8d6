//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::domain::IdentityVerifier;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::usecase::{
    AuthUseCase, ChatUseCase, JoinRoomUseCase, LeaveRoomUseCase, RouteMessageUseCase,
    RouteTypingUseCase,
};

use super::{
    handler::{
        add_group_members, change_password, create_group, direct_history, group_history,
        health_check, list_direct_chats, login, logout, logout_all, me, my_groups, online_users,
        refresh, register, remove_group_member, send_direct_message, send_group_message,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Build the application router over a shared [`AppState`].
///
/// Separate from [`Server::run`] so integration tests can serve the exact
/// same router from an ephemeral port inside the test process.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント（トークンは URI に埋め込む）
        .route("/ws/{token}", get(websocket_handler))
        // 認証
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_all))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/me", get(me))
        // ダイレクトメッセージ
        .route("/api/messages/send", post(send_direct_message))
        .route("/api/messages/chat/{other_user_id}", get(direct_history))
        .route("/api/messages/chats", get(list_direct_chats))
        // グループ
        .route("/api/groups/create", post(create_group))
        .route("/api/groups/send", post(send_group_message))
        .route("/api/groups/{group_id}/messages", get(group_history))
        .route(
            "/api/groups/{group_id}/members",
            post(add_group_members).delete(remove_group_member),
        )
        .route("/api/groups/my-groups", get(my_groups))
        // プレゼンス・ヘルスチェック
        .route("/api/online-users", get(online_users))
        .route("/api/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Messaging server
///
/// This struct encapsulates the server dependencies and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     registry,
///     verifier,
///     auth_usecase,
///     chat_usecase,
///     join_room_usecase,
///     leave_room_usecase,
///     route_message_usecase,
///     route_typing_usecase,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectionRegistry（プレゼンス・購読・ファンアウトの共有状態）
    registry: Arc<ConnectionRegistry>,
    /// IdentityVerifier（Bearer 資格情報の検証）
    verifier: Arc<dyn IdentityVerifier>,
    /// AuthUseCase（認証・アカウント操作のユースケース）
    auth_usecase: Arc<AuthUseCase>,
    /// ChatUseCase（チャット CRUD のユースケース）
    chat_usecase: Arc<ChatUseCase>,
    /// JoinRoomUseCase（ルーム購読参加のユースケース）
    join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム購読離脱のユースケース）
    leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// RouteMessageUseCase（メッセージルーティングのユースケース）
    route_message_usecase: Arc<RouteMessageUseCase>,
    /// RouteTypingUseCase（入力中インジケータのユースケース）
    route_typing_usecase: Arc<RouteTypingUseCase>,
}

impl Server {
    /// Create a new Server instance
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        verifier: Arc<dyn IdentityVerifier>,
        auth_usecase: Arc<AuthUseCase>,
        chat_usecase: Arc<ChatUseCase>,
        join_room_usecase: Arc<JoinRoomUseCase>,
        leave_room_usecase: Arc<LeaveRoomUseCase>,
        route_message_usecase: Arc<RouteMessageUseCase>,
        route_typing_usecase: Arc<RouteTypingUseCase>,
    ) -> Self {
        Self {
            registry,
            verifier,
            auth_usecase,
            chat_usecase,
            join_room_usecase,
            leave_room_usecase,
            route_message_usecase,
            route_typing_usecase,
        }
    }

    /// Run the messaging server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            registry: self.registry,
            verifier: self.verifier,
            auth_usecase: self.auth_usecase,
            chat_usecase: self.chat_usecase,
            join_room_usecase: self.join_room_usecase,
            leave_room_usecase: self.leave_room_usecase,
            route_message_usecase: self.route_message_usecase,
            route_typing_usecase: self.route_typing_usecase,
        });

        let app = router(app_state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!("Messaging server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws/{{token}}", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
