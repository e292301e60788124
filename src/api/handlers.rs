//! Request handlers

use super::errors::ApiError;
use super::models::*;
use crate::engine::GameEngine;
use crate::types::Session;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state
pub struct AppState {
    pub engine: Arc<GameEngine>,
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        live_sessions: state.engine.registry().len(),
    })
}

/// POST /sessions/join — find a matching session or open a new one
pub async fn join_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state.engine.create_or_join(
        request.game_type,
        request.stake_amount,
        request.currency,
        request.player,
    )?;
    Ok(Json(session))
}

/// POST /sessions/:id/choice
pub async fn choice_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChoiceRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = state
        .engine
        .submit_choice(session_id, &request.participant_id, request.choice)
        .await?;
    Ok(Json(session))
}

/// POST /sessions/:id/leave
pub async fn leave_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<LeaveRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.engine.leave(session_id, &request.participant_id)?;
    Ok(Json(serde_json::json!({ "left": true })))
}

/// GET /sessions — waiting sessions, optionally filtered by game type
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<SessionListResponse> {
    let sessions = state.engine.list_waiting(query.game_type);
    let count = sessions.len();
    Json(SessionListResponse { sessions, count })
}

/// GET /sessions/:id
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Session>, ApiError> {
    Ok(Json(state.engine.session(session_id)?))
}
