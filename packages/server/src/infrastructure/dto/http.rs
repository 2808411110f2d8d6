//! HTTP API request and response DTOs.
//!
//! Timestamps cross the boundary as RFC 3339 strings; identifiers keep
//! their domain newtypes, which serialize as plain JSON numbers.

use serde::{Deserialize, Serialize};

use crate::domain::{MessageId, RoomId, UserId};

// ========================================
// Request bodies
// ========================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Login accepts the registered username or the e-mail address.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SendDirectMessageRequest {
    pub recipient_id: UserId,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub member_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct SendGroupMessageRequest {
    pub group_id: RoomId,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AddMembersRequest {
    pub member_ids: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberRequest {
    pub user_id: UserId,
}

/// Paging parameters for message history endpoints.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ========================================
// Response bodies
// ========================================

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPairDto {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Body returned by register, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponseDto {
    pub user: UserDto,
    pub tokens: TokenPairDto,
}

/// A persisted message, as returned by the send endpoints.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

/// A history entry, joined with the sender's username.
#[derive(Debug, Serialize)]
pub struct ChatMessageDto {
    pub id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct RoomDto {
    pub id: RoomId,
    pub name: Option<String>,
    pub kind: String,
    pub created_by: Option<UserId>,
    pub created_at: String,
}

/// One row of the direct-chat overview list.
#[derive(Debug, Serialize)]
pub struct DirectChatSummaryDto {
    pub room_id: RoomId,
    pub other_user_id: UserId,
    pub other_username: String,
    pub other_full_name: Option<String>,
    pub last_message: Option<String>,
    pub last_message_at: Option<String>,
    pub unread_count: i64,
}

#[derive(Debug, Serialize)]
pub struct OnlineUsersDto {
    pub online_users: Vec<UserId>,
    pub count: usize,
}
