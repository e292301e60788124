//! Error types for the session engine
//!
//! Errors local to one session are returned to the specific caller and never
//! affect other sessions or the process.

use uuid::Uuid;

/// Root error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// Session id is not (or no longer) in the registry
    #[error("session not found: {0}")]
    NotFound(Uuid),

    /// Action is not valid for the session's current status
    #[error("invalid transition for session {session_id}: {action} while {status}")]
    InvalidTransition {
        session_id: Uuid,
        action: String,
        status: String,
    },

    /// Join attempted on a session that is already full
    #[error("session {0} is at capacity")]
    CapacityExceeded(Uuid),

    /// Choice submitted for a game type that takes none, or by a non-member
    #[error("choice not accepted for session {session_id}: {reason}")]
    ChoiceNotAccepted { session_id: Uuid, reason: String },

    /// Stake must be a positive amount
    #[error("invalid stake amount: {0}")]
    InvalidStake(f64),

    /// Configuration loading or validation failed
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GameError {
    pub fn invalid_transition(
        session_id: Uuid,
        action: impl Into<String>,
        status: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            session_id,
            action: action.into(),
            status: status.to_string(),
        }
    }
}

/// Convenience alias for engine results
pub type GameResult<T> = Result<T, GameError>;
