//! Data Transfer Objects (DTOs) for the chat backend.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame DTOs
//! - `http`: HTTP API request/response DTOs
//! - `conversion`: domain entity → DTO conversions

pub mod conversion;
pub mod http;
pub mod websocket;
