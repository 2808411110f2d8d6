//! Irori messaging server library.
//!
//! A real-time messaging backend: JWT-authenticated users exchange direct and
//! group messages over HTTP, and receive live room events over a WebSocket
//! connection managed by an in-process connection registry.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
