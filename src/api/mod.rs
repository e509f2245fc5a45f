//! API module
//!
//! Contains HTTP request handlers for the chat widget endpoints.

pub mod chat;
pub mod session;
pub mod streaming;

use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Build the widget routes
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(chat::index))
        .route("/chat", post(chat::chat))
        .route("/history", get(chat::history))
        .route("/clear", post(chat::clear))
        .with_state(state)
}
