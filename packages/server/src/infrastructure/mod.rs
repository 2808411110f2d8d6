//! インフラストラクチャ層
//!
//! ## 概要
//!
//! ドメイン層の trait（`ChatStore`, `IdentityVerifier`）の具体的な実装と、
//! プロセス内の接続状態を担うモジュール群です。
//!
//! ## モジュール
//!
//! - `dto`: HTTP / WebSocket のワイヤフォーマット定義と変換
//! - `registry`: 在室状況と購読を管理する接続レジストリ
//! - `security`: JWT・パスワードハッシュ・トークン検証
//! - `store`: SQLite による永続化

pub mod dto;
pub mod registry;
pub mod security;
pub mod store;

pub use registry::{ConnectionId, ConnectionRegistry, FrameSink, RegistryError};
pub use store::SqliteChatStore;
