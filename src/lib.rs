//! Widget Chat Relay Library
//!
//! Server-side relay between a browser chat widget and a streaming chat
//! completion service. The main binary is in `src/main.rs`.

pub mod api;
/// Citation markup removal
pub mod citations;
pub mod chat;
pub mod config;
pub mod error;
pub mod notify;
pub mod relay;
pub mod state;
