//! 値オブジェクト定義
//!
//! ID 系は整数の newtype、本文・ユーザー名はコンストラクタで
//! バリデーション済みであることを保証します。

use serde::{Deserialize, Serialize};

use super::error::{ContentError, UsernameError};

/// ユーザー ID（`users` テーブルの主キー）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ルーム ID（`chat_rooms` テーブルの主キー）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct RoomId(pub i64);

impl RoomId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メッセージ ID（`messages` テーブルの主キー）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct MessageId(pub i64);

impl MessageId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// メッセージ本文
///
/// trim 後に空でないこと、[`MessageContent::MAX_CHARS`] 文字以内であることを
/// コンストラクタで保証します。本文そのものは送信されたまま保持します
/// （保存時に trim で書き換えない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContent(String);

impl MessageContent {
    pub const MAX_CHARS: usize = 5000;

    pub fn new(raw: impl Into<String>) -> Result<Self, ContentError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ContentError::Empty);
        }
        if raw.chars().count() > Self::MAX_CHARS {
            return Err(ContentError::TooLong {
                max: Self::MAX_CHARS,
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for MessageContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザー名（3〜50 文字）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Username(String);

impl Username {
    pub const MIN_CHARS: usize = 3;
    pub const MAX_CHARS: usize = 50;

    pub fn new(raw: impl Into<String>) -> Result<Self, UsernameError> {
        let raw = raw.into();
        let chars = raw.chars().count();
        if chars < Self::MIN_CHARS || chars > Self::MAX_CHARS {
            return Err(UsernameError::InvalidLength {
                min: Self::MIN_CHARS,
                max: Self::MAX_CHARS,
            });
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_content_accepts_plain_text() {
        // テスト項目: 通常のテキストで MessageContent が生成できる
        // given (前提条件):
        let raw = "Hello, irori!";

        // when (操作):
        let content = MessageContent::new(raw);

        // then (期待する結果):
        assert_eq!(content.unwrap().as_str(), "Hello, irori!");
    }

    #[test]
    fn test_message_content_keeps_surrounding_whitespace() {
        // テスト項目: 前後の空白は trim されずそのまま保持される
        // given (前提条件):
        let raw = "  hi  ";

        // when (操作):
        let content = MessageContent::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(content.as_str(), "  hi  ");
    }

    #[test]
    fn test_message_content_rejects_empty_string() {
        // テスト項目: 空文字列は Empty エラーになる
        // given (前提条件):
        let raw = "";

        // when (操作):
        let result = MessageContent::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ContentError::Empty);
    }

    #[test]
    fn test_message_content_rejects_whitespace_only() {
        // テスト項目: 空白のみの本文は Empty エラーになる
        // given (前提条件):
        let raw = "   \n\t  ";

        // when (操作):
        let result = MessageContent::new(raw);

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), ContentError::Empty);
    }

    #[test]
    fn test_message_content_rejects_too_long_content() {
        // テスト項目: 上限を超える本文は TooLong エラーになる
        // given (前提条件):
        let raw = "a".repeat(MessageContent::MAX_CHARS + 1);

        // when (操作):
        let result = MessageContent::new(raw);

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            ContentError::TooLong {
                max: MessageContent::MAX_CHARS
            }
        );
    }

    #[test]
    fn test_message_content_accepts_max_length_content() {
        // テスト項目: ちょうど上限の長さの本文は受理される
        // given (前提条件):
        let raw = "a".repeat(MessageContent::MAX_CHARS);

        // when (操作):
        let result = MessageContent::new(raw);

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[test]
    fn test_username_accepts_valid_length() {
        // テスト項目: 3〜50 文字のユーザー名が受理される
        // given (前提条件):
        let raw = "alice";

        // when (操作):
        let username = Username::new(raw);

        // then (期待する結果):
        assert_eq!(username.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_username_rejects_too_short_name() {
        // テスト項目: 3 文字未満のユーザー名は拒否される
        // given (前提条件):
        let raw = "ab";

        // when (操作):
        let result = Username::new(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_username_rejects_too_long_name() {
        // テスト項目: 50 文字を超えるユーザー名は拒否される
        // given (前提条件):
        let raw = "x".repeat(51);

        // when (操作):
        let result = Username::new(raw);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_user_id_display() {
        // テスト項目: UserId が素の整数として表示される
        // given (前提条件):
        let id = UserId(42);

        // when (操作):
        let shown = id.to_string();

        // then (期待する結果):
        assert_eq!(shown, "42");
        assert_eq!(id.value(), 42);
    }
}
