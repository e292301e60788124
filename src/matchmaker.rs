//! Matchmaking
//!
//! First-fit scan over waiting sessions with matching terms; falls back to
//! creating a new session. The capacity/status check and the join itself are
//! one atomic step under the session's own lock, so concurrent joins can
//! never overfill a session or join one that already started.

use crate::errors::GameError;
use crate::registry::SessionRegistry;
use crate::session::{JoinEffect, SessionHandle};
use crate::types::{Currency, GameType, Participant};
use std::sync::Arc;

/// How a participant ended up in a session
#[derive(Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No joinable session; a new one was created
    Created,
    /// Joined an existing session that keeps waiting
    Joined,
    /// Join filled capacity; the session started
    Started,
}

/// Find a joinable session for (game type, stake, currency) or create one.
/// No fairness ordering is guaranteed among candidate sessions.
pub fn find_or_create(
    registry: &SessionRegistry,
    game_type: GameType,
    stake_amount: f64,
    currency: &Currency,
    participant: Participant,
) -> (Arc<SessionHandle>, MatchOutcome) {
    for handle in registry.handles() {
        let snapshot = handle.snapshot();
        if snapshot.game_type != game_type || snapshot.currency != *currency {
            continue;
        }
        // Coinflip terms fix the stake for both sides; jackpot participants
        // each bring their own contribution to the pool.
        if game_type.uniform_stake() && snapshot.stake_amount != stake_amount {
            continue;
        }

        // Re-validated atomically inside try_join; a stale snapshot only
        // costs a failed attempt.
        match handle.try_join(participant.clone()) {
            Ok(JoinEffect::Joined) => return (handle, MatchOutcome::Joined),
            Ok(JoinEffect::Started) => return (handle, MatchOutcome::Started),
            Err(GameError::CapacityExceeded(_)) | Err(GameError::InvalidTransition { .. }) => {
                continue
            }
            Err(_) => continue,
        }
    }

    let handle = registry.create(game_type, stake_amount, currency.clone(), participant);
    (handle, MatchOutcome::Created)
}
