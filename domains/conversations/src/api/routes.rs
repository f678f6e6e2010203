//! Route definitions for Conversations domain API

use axum::{routing::post, Router};

use super::handlers::{chat, conversations};
use super::middleware::ConversationsState;

/// Create conversation listing routes
fn conversation_routes() -> Router<ConversationsState> {
    Router::new().route(
        "/api/conversations",
        post(conversations::list_conversations),
    )
}

/// Create query relay routes
fn chat_routes() -> Router<ConversationsState> {
    Router::new().route("/api/chat", post(chat::submit_query))
}

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new()
        .merge(conversation_routes())
        .merge(chat_routes())
}
