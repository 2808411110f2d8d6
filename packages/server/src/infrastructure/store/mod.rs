//! ChatStore 実装
//!
//! ## 概要
//!
//! このモジュールは `ChatStore` trait の具体的な実装を提供します。
//!
//! ## 実装
//!
//! - `sqlite`: sqlx + SQLite を使った実装
//! - 将来的に: `postgres` など

pub mod sqlite;

pub use sqlite::SqliteChatStore;
