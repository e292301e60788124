//! In-memory session registry
//!
//! Concurrent map of live sessions keyed by session id. Lookups proceed
//! concurrently; inserts and deletes are independent of any one session's
//! internal state. The registry performs no business logic.

use crate::errors::{GameError, GameResult};
use crate::session::SessionHandle;
use crate::types::{Currency, GameType, Participant, Session};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct SessionRegistry {
    sessions: DashMap<Uuid, Arc<SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create a session with its first participant and register it
    pub fn create(
        &self,
        game_type: GameType,
        stake_amount: f64,
        currency: Currency,
        first: Participant,
    ) -> Arc<SessionHandle> {
        let handle = Arc::new(SessionHandle::new(Session::new(
            game_type,
            stake_amount,
            currency,
            first,
        )));
        self.sessions.insert(handle.id, Arc::clone(&handle));
        handle
    }

    pub fn get(&self, id: Uuid) -> GameResult<Arc<SessionHandle>> {
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(GameError::NotFound(id))
    }

    /// Remove a session; no-op if already absent
    pub fn delete(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// All live session handles (matchmaking scan)
    pub fn handles(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Snapshots of sessions still accepting participants, newest first
    pub fn waiting_snapshots(&self, game_type: Option<GameType>) -> Vec<Session> {
        let mut snapshots: Vec<Session> = self
            .sessions
            .iter()
            .map(|entry| entry.value().snapshot())
            .filter(|s| s.status == crate::types::SessionStatus::Waiting)
            .filter(|s| game_type.map_or(true, |g| s.game_type == g))
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        snapshots
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
