//! API request and response models

use crate::types::{CoinSide, Currency, GameType, PlayerProfile, Session};
use serde::{Deserialize, Serialize};

/// POST /sessions/join
#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    pub game_type: GameType,
    pub stake_amount: f64,
    pub currency: Currency,
    pub player: PlayerProfile,
}

/// POST /sessions/:id/choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceRequest {
    pub participant_id: String,
    pub choice: CoinSide,
}

/// POST /sessions/:id/leave
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveRequest {
    pub participant_id: String,
}

/// GET /sessions query
#[derive(Debug, Clone, Deserialize)]
pub struct ListQuery {
    pub game_type: Option<GameType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub live_sessions: usize,
}
