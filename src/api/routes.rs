//! Route definitions

use super::handlers::*;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sessions", get(list_handler))
        .route("/sessions/join", post(join_handler))
        .route("/sessions/:id", get(session_handler))
        .route("/sessions/:id/choice", post(choice_handler))
        .route("/sessions/:id/leave", post(leave_handler))
        .with_state(state)
}
