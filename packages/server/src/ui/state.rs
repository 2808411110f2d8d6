//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::IdentityVerifier;
use crate::infrastructure::registry::ConnectionRegistry;
use crate::usecase::{
    AuthUseCase, ChatUseCase, JoinRoomUseCase, LeaveRoomUseCase, RouteMessageUseCase,
    RouteTypingUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectionRegistry（プレゼンス・購読・ファンアウトの共有状態）
    pub registry: Arc<ConnectionRegistry>,
    /// IdentityVerifier（Bearer 資格情報の検証の抽象化）
    pub verifier: Arc<dyn IdentityVerifier>,
    /// AuthUseCase（認証・アカウント操作のユースケース）
    pub auth_usecase: Arc<AuthUseCase>,
    /// ChatUseCase（チャット CRUD のユースケース）
    pub chat_usecase: Arc<ChatUseCase>,
    /// JoinRoomUseCase（ルーム購読参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム購読離脱のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// RouteMessageUseCase（メッセージルーティングのユースケース）
    pub route_message_usecase: Arc<RouteMessageUseCase>,
    /// RouteTypingUseCase（入力中インジケータのユースケース）
    pub route_typing_usecase: Arc<RouteTypingUseCase>,
}
