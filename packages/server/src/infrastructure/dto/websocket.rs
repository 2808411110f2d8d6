//! WebSocket frame DTOs.
//!
//! Every frame on the wire is a JSON object tagged by its `type` field.
//! Inbound and outbound frames are separate enums: clients never receive
//! an inbound frame type and the server never parses an outbound one.

use serde::{Deserialize, Serialize};

use crate::domain::{MessageId, MessageRecord, RoomId, UserId};

// ========================================
// Client → Server
// ========================================

/// Frames a client may send over an established connection.
///
/// A `type` value this server does not know deserializes as
/// [`InboundFrame::Unknown`], so the session loop can answer with an
/// `error` frame instead of tearing the connection down.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    JoinRoom { room_id: RoomId },
    LeaveRoom { room_id: RoomId },
    Message { room_id: RoomId, content: String },
    Typing { room_id: RoomId },
    Ping,
    #[serde(other)]
    Unknown,
}

// ========================================
// Server → Client
// ========================================

/// Frames the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    /// First frame of every session, sent right after the upgrade.
    Connected { user_id: UserId, username: String },
    /// Ack for a successful `join_room`.
    RoomJoined { room_id: RoomId },
    /// Ack for a `leave_room`.
    RoomLeft { room_id: RoomId },
    /// Someone else subscribed to a room the recipient is in.
    UserJoined {
        room_id: RoomId,
        user_id: UserId,
        username: String,
    },
    /// Someone else unsubscribed from a room the recipient is in.
    UserLeft {
        room_id: RoomId,
        user_id: UserId,
        username: String,
    },
    /// A persisted chat message, fanned out to every subscriber.
    NewMessage {
        room_id: RoomId,
        message_id: MessageId,
        sender_id: UserId,
        sender_username: String,
        content: String,
        created_at: String,
    },
    /// Typing indicator, fanned out to everyone but the typist.
    UserTyping {
        room_id: RoomId,
        user_id: UserId,
        username: String,
    },
    /// Reply to an application-level `ping`.
    Pong,
    /// Per-frame failure report. The connection stays open.
    Error { message: String },
}

impl OutboundFrame {
    /// Build a `new_message` frame from a freshly persisted record.
    pub fn new_message(record: &MessageRecord, sender_username: &str) -> Self {
        Self::NewMessage {
            room_id: record.room_id,
            message_id: record.id,
            sender_id: record.sender_id,
            sender_username: sender_username.to_string(),
            content: record.content.clone(),
            created_at: record.created_at.to_rfc3339(),
        }
    }

    /// Serialize into the wire representation.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
