//! UseCase 層
//!
//! ## 概要
//!
//! アプリケーションのビジネスロジックを担う層。ドメイン層の trait と
//! インフラ層の ConnectionRegistry / TokenService を組み合わせ、
//! UI 層（HTTP / WebSocket ハンドラ）から呼び出されます。
//!
//! ## モジュール
//!
//! - `auth`: 認証・アカウント操作
//! - `chat`: チャット CRUD（ダイレクト・グループ）
//! - `join_room` / `leave_room`: ルーム購読の出入り
//! - `route_message` / `route_typing`: ライブ配信の中核経路

pub mod auth;
pub mod chat;
pub mod error;
pub mod join_room;
pub mod leave_room;
pub mod route_message;
pub mod route_typing;

pub use auth::AuthUseCase;
pub use chat::ChatUseCase;
pub use error::{AuthError, ChatError, JoinRoomError, LeaveRoomError, RouteMessageError};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use route_message::RouteMessageUseCase;
pub use route_typing::RouteTypingUseCase;
