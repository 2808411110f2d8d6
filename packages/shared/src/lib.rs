//! Shared utilities for the Irori messaging application.
//!
//! Cross-cutting concerns used by the server binary and its tests:
//! logging setup and clock abstraction.

pub mod logger;
pub mod time;
