//! Route definitions
//!
//! Defines all HTTP API endpoints.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{cancel, chat, confirm, health, messages, pending, submit};
use crate::server::AppState;

/// Create the API router
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Chat endpoint
        .route("/api/chat", post(chat))
        // Inbound participant messages
        .route("/api/participants/{name}/submit", post(submit))
        // Session transcript and pending confirmation
        .route("/api/sessions/{session}/messages", get(messages))
        .route("/api/sessions/{session}/pending", get(pending))
        .route("/api/sessions/{session}/confirm", post(confirm))
        .route("/api/sessions/{session}/cancel", post(cancel))
}
