//! ドメイン層
//!
//! エンティティ・値オブジェクト・ドメインエラーと、ドメイン層が必要とする
//! 外部コラボレータのインターフェース（`ChatStore` / `IdentityVerifier`）を
//! 定義します。具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

mod entity;
mod error;
mod store;
mod value_object;
mod verifier;

pub use entity::{
    DirectChatSummary, MessageRecord, MessageWithSender, RefreshTokenRecord, Room, RoomKind, User,
};
pub use error::{ContentError, StoreError, UsernameError, VerifyError};
pub use store::ChatStore;
pub use value_object::{MessageContent, MessageId, RoomId, UserId, Username};
pub use verifier::{Identity, IdentityVerifier};

#[cfg(test)]
pub use store::MockChatStore;
#[cfg(test)]
pub use verifier::MockIdentityVerifier;
