//! Per-session state machine
//!
//! Each live session is owned by a [`SessionHandle`]: every field mutation
//! goes through its internal lock, so client actions and timer callbacks are
//! serialized against each other. The `resolved` flag is the resolve-once
//! guard; whichever trigger wins the compare-exchange performs resolution,
//! the loser is a silent no-op.

use crate::errors::{GameError, GameResult};
use crate::resolver::DrawSource;
use crate::types::{CoinSide, Participant, Session, SessionStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// What a successful join did to the session
#[derive(Debug, PartialEq, Eq)]
pub enum JoinEffect {
    /// Joined; session is still waiting for more participants
    Joined,
    /// Join filled capacity; session moved to playing
    Started,
}

/// What a successful choice submission did to the session
#[derive(Debug, PartialEq, Eq)]
pub enum ChoiceEffect {
    /// Choice recorded
    Accepted,
    /// Choice recorded and every participant has now chosen
    ReadyToResolve,
}

/// Result of a participant leaving before the game starts
#[derive(Debug, PartialEq, Eq)]
pub enum LeaveEffect {
    /// Participant removed; others remain waiting
    Remaining,
    /// Last participant left; the session should be discarded
    Discarded,
    /// Session already started; departure does not block resolution
    Ignored,
}

/// Single owner of one session's mutable state
#[derive(Debug)]
pub struct SessionHandle {
    pub id: Uuid,
    state: Mutex<Session>,
    resolved: AtomicBool,
    discarded: AtomicBool,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            id: session.id,
            state: Mutex::new(session),
            resolved: AtomicBool::new(false),
            discarded: AtomicBool::new(false),
            timers: Mutex::new(Vec::new()),
        }
    }

    /// Clone of the current session state
    pub fn snapshot(&self) -> Session {
        self.state.lock().unwrap().clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.lock().unwrap().status
    }

    /// Atomically validate capacity and status, then add the participant.
    /// Returns [`JoinEffect::Started`] when this join filled capacity and the
    /// session transitioned to playing.
    pub fn try_join(&self, participant: Participant) -> GameResult<JoinEffect> {
        let mut state = self.state.lock().unwrap();

        // A matchmaking scan can hold this handle past its registry delete;
        // the tombstone keeps such a join from landing in a dead session.
        if self.discarded.load(Ordering::Acquire) {
            return Err(GameError::NotFound(self.id));
        }
        if state.status != SessionStatus::Waiting {
            return Err(GameError::invalid_transition(
                self.id,
                "join",
                state.status,
            ));
        }
        if !state.has_room() {
            return Err(GameError::CapacityExceeded(self.id));
        }
        if state.participant(&participant.id).is_some() {
            return Err(GameError::invalid_transition(
                self.id,
                "join (already a member)",
                state.status,
            ));
        }

        state.participants.push(participant);

        if state.capacity_filled() {
            state.status = SessionStatus::Playing;
            Ok(JoinEffect::Started)
        } else {
            Ok(JoinEffect::Joined)
        }
    }

    /// Record a participant's choice. Rejected once the session completed,
    /// for game types that take no choice, and for non-members.
    pub fn submit_choice(
        &self,
        participant_id: &str,
        choice: CoinSide,
    ) -> GameResult<ChoiceEffect> {
        let mut state = self.state.lock().unwrap();

        if state.status == SessionStatus::Completed {
            return Err(GameError::invalid_transition(
                self.id,
                "submit choice",
                state.status,
            ));
        }
        if !state.game_type.requires_choice() {
            return Err(GameError::ChoiceNotAccepted {
                session_id: self.id,
                reason: format!("{} takes no choice", state.game_type),
            });
        }

        let playing = state.status == SessionStatus::Playing;
        let participant = state
            .participants
            .iter_mut()
            .find(|p| p.id == participant_id)
            .ok_or_else(|| GameError::ChoiceNotAccepted {
                session_id: self.id,
                reason: format!("{} is not a participant", participant_id),
            })?;
        participant.choice = Some(choice);

        if playing && state.all_choices_in() {
            Ok(ChoiceEffect::ReadyToResolve)
        } else {
            Ok(ChoiceEffect::Accepted)
        }
    }

    /// Countdown expiry for games that start on a timer. Returns true when
    /// the transition happened; false when the session already advanced.
    pub fn begin_playing(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if self.discarded.load(Ordering::Acquire) || state.status != SessionStatus::Waiting {
            return false;
        }
        state.status = SessionStatus::Playing;
        true
    }

    /// Handle a participant disconnecting. Before the game starts they are
    /// removed; afterwards the deadline timer guarantees forward progress.
    pub fn leave(&self, participant_id: &str) -> GameResult<LeaveEffect> {
        let mut state = self.state.lock().unwrap();

        if state.status != SessionStatus::Waiting {
            return Ok(LeaveEffect::Ignored);
        }

        let before = state.participants.len();
        state.participants.retain(|p| p.id != participant_id);
        if state.participants.len() == before {
            return Err(GameError::invalid_transition(
                self.id,
                "leave (not a member)",
                state.status,
            ));
        }

        if state.participants.is_empty() {
            // Tombstone while still holding the lock: the caller deletes the
            // registry entry next, and a join racing through a stale handle
            // must not slip in between.
            self.discarded.store(true, Ordering::Release);
            Ok(LeaveEffect::Discarded)
        } else {
            Ok(LeaveEffect::Remaining)
        }
    }

    /// Resolve-once guard. The first caller wins and must carry resolution
    /// through; every later caller gets false.
    pub fn try_begin_resolution(&self) -> bool {
        self.resolved
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    /// Assign uniformly-random default choices to participants that never
    /// chose, then return the state to resolve from. Only the guard winner
    /// may call this.
    pub fn finalize_choices(&self, draw: &dyn DrawSource) -> Session {
        let mut state = self.state.lock().unwrap();
        if state.game_type.requires_choice() {
            for participant in state.participants.iter_mut() {
                if participant.choice.is_none() {
                    participant.choice = Some(draw.coin());
                }
            }
        }
        state.clone()
    }

    /// Final transition into completed; sets the outcome exactly once.
    pub fn record_outcome(&self, outcome: crate::types::Outcome) -> Session {
        let mut state = self.state.lock().unwrap();
        state.status = SessionStatus::Completed;
        state.outcome = Some(outcome);
        state.clone()
    }

    /// Attach transfer delivery statuses after settlement was attempted
    pub fn attach_settlement(&self, report: crate::types::SettlementReport) {
        let mut state = self.state.lock().unwrap();
        if let Some(outcome) = state.outcome.as_mut() {
            outcome.settlement = Some(report);
        }
    }

    /// Register a pending timer task for later cancellation
    pub fn add_timer(&self, handle: JoinHandle<()>) {
        self.timers.lock().unwrap().push(handle);
    }

    /// Abort every pending timer. Safe to call from a resolution path:
    /// resolution never runs inside a registered timer task.
    pub fn cancel_timers(&self) {
        for handle in self.timers.lock().unwrap().drain(..) {
            handle.abort();
        }
    }
}
