//! Conversion logic between domain entities and HTTP DTOs.
//!
//! All conversions run one way, domain to wire. Inbound request bodies are
//! taken apart field by field in the handlers instead, because their parts
//! go through value-object validation individually.

use crate::domain::{DirectChatSummary, MessageRecord, MessageWithSender, Room, User};
use crate::infrastructure::dto::http as dto;
use crate::infrastructure::security::TokenPair;

// ========================================
// Domain Entity → DTO
// ========================================

impl From<User> for dto::UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

impl From<TokenPair> for dto::TokenPairDto {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "bearer".to_string(),
        }
    }
}

impl From<MessageRecord> for dto::MessageDto {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            room_id: record.room_id,
            sender_id: record.sender_id,
            content: record.content,
            is_read: record.is_read,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl From<MessageWithSender> for dto::ChatMessageDto {
    fn from(record: MessageWithSender) -> Self {
        Self {
            id: record.id,
            room_id: record.room_id,
            sender_id: record.sender_id,
            sender_username: record.sender_username,
            content: record.content,
            is_read: record.is_read,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

impl From<Room> for dto::RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: room.name,
            kind: room.kind.as_str().to_string(),
            created_by: room.created_by,
            created_at: room.created_at.to_rfc3339(),
        }
    }
}

impl From<DirectChatSummary> for dto::DirectChatSummaryDto {
    fn from(summary: DirectChatSummary) -> Self {
        Self {
            room_id: summary.room_id,
            other_user_id: summary.other_user_id,
            other_username: summary.other_username,
            other_full_name: summary.other_full_name,
            last_message: summary.last_message,
            last_message_at: summary.last_message_at.map(|at| at.to_rfc3339()),
            unread_count: summary.unread_count,
        }
    }
}
