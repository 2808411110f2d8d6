//! Request handlers for the HTTP API and the WebSocket endpoint.

mod http;
mod websocket;

pub use http::{
    add_group_members, change_password, create_group, direct_history, group_history, health_check,
    list_direct_chats, login, logout, logout_all, me, my_groups, online_users, refresh, register,
    remove_group_member, send_direct_message, send_group_message,
};
pub use websocket::websocket_handler;
