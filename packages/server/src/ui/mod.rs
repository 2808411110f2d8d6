//! Messaging server UI layer: router, handlers, shared state.

mod handler;
mod server;
mod signal;
pub mod state; // 統合テストから AppState を組み立てるため public

pub use server::{Server, router};
