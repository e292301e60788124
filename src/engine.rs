//! Game engine
//!
//! Wires the registry, matchmaker, resolver, settlement, broadcaster and
//! cleanup scheduler behind the client-facing actions. Sessions are
//! independent units of work: timers and participant actions for one session
//! serialize on that session's handle and never block unrelated sessions.

use crate::broadcast::SessionBroadcaster;
use crate::cleanup::CleanupScheduler;
use crate::config::EngineConfig;
use crate::errors::{GameError, GameResult};
use crate::matchmaker::{self, MatchOutcome};
use crate::registry::SessionRegistry;
use crate::resolver::{self, DrawSource};
use crate::session::{ChoiceEffect, LeaveEffect, SessionHandle};
use crate::settlement::{self, TransferService};
use crate::types::{
    CoinSide, Currency, GameType, Outcome, Participant, PlayerProfile, Session, SessionEvent,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct GameEngine {
    config: EngineConfig,
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<dyn SessionBroadcaster>,
    transfer: Arc<dyn TransferService>,
    draw: Arc<dyn DrawSource>,
    cleanup: CleanupScheduler,
}

impl GameEngine {
    pub fn new(
        config: EngineConfig,
        broadcaster: Arc<dyn SessionBroadcaster>,
        transfer: Arc<dyn TransferService>,
        draw: Arc<dyn DrawSource>,
    ) -> Arc<Self> {
        let registry = Arc::new(SessionRegistry::new());
        let cleanup = CleanupScheduler::new(Arc::clone(&registry));
        Arc::new(Self {
            config,
            registry,
            broadcaster,
            transfer,
            draw,
            cleanup,
        })
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Join a session with matching terms, or open a new one. Returns the
    /// session state after the join took effect.
    pub fn create_or_join(
        self: &Arc<Self>,
        game_type: GameType,
        stake_amount: f64,
        currency: Currency,
        profile: PlayerProfile,
    ) -> GameResult<Session> {
        if !stake_amount.is_finite() || stake_amount <= 0.0 {
            return Err(GameError::InvalidStake(stake_amount));
        }

        let participant = Participant::new(profile, stake_amount);
        let participant_id = participant.id.clone();
        let (handle, outcome) = matchmaker::find_or_create(
            &self.registry,
            game_type,
            stake_amount,
            &currency,
            participant,
        );
        let snapshot = handle.snapshot();

        match outcome {
            MatchOutcome::Created => {
                info!(session_id = %handle.id, %game_type, stake_amount, "session created");
                self.broadcaster.publish(SessionEvent::Created {
                    session: snapshot.clone(),
                });
                if game_type == GameType::Jackpot {
                    self.start_countdown(&handle);
                }
            }
            MatchOutcome::Joined => {
                self.publish_join(&snapshot, &participant_id);
            }
            MatchOutcome::Started => {
                info!(session_id = %handle.id, %game_type, "session started");
                self.publish_join(&snapshot, &participant_id);
                self.broadcaster.publish(SessionEvent::Started {
                    session_id: handle.id,
                });
                self.start_resolution_timer(&handle);
            }
        }

        Ok(snapshot)
    }

    /// Record a participant's choice; resolves immediately once every
    /// required choice is in.
    pub async fn submit_choice(
        self: &Arc<Self>,
        session_id: Uuid,
        participant_id: &str,
        choice: CoinSide,
    ) -> GameResult<Session> {
        let handle = self.registry.get(session_id)?;
        let effect = handle.submit_choice(participant_id, choice)?;

        self.broadcaster.publish(SessionEvent::ChoiceAccepted {
            session_id,
            participant_id: participant_id.to_string(),
        });

        if effect == ChoiceEffect::ReadyToResolve {
            self.resolve(Arc::clone(&handle)).await;
        }

        Ok(handle.snapshot())
    }

    /// Participant disconnected or backed out. Only affects sessions that
    /// have not started; an emptied session is discarded.
    pub fn leave(&self, session_id: Uuid, participant_id: &str) -> GameResult<()> {
        let handle = self.registry.get(session_id)?;
        match handle.leave(participant_id)? {
            LeaveEffect::Discarded => {
                handle.cancel_timers();
                self.registry.delete(session_id);
                info!(%session_id, "empty session discarded");
            }
            LeaveEffect::Remaining | LeaveEffect::Ignored => {}
        }
        Ok(())
    }

    /// Sessions still accepting participants, newest first
    pub fn list_waiting(&self, game_type: Option<GameType>) -> Vec<Session> {
        self.registry.waiting_snapshots(game_type)
    }

    pub fn session(&self, session_id: Uuid) -> GameResult<Session> {
        Ok(self.registry.get(session_id)?.snapshot())
    }

    /// Cancel all timers and pending removals; called on process shutdown
    pub fn shutdown(&self) {
        for handle in self.registry.handles() {
            handle.cancel_timers();
        }
        self.cleanup.shutdown();
    }

    fn publish_join(&self, snapshot: &Session, participant_id: &str) {
        if let Some(participant) = snapshot.participant(participant_id) {
            self.broadcaster.publish(SessionEvent::ParticipantJoined {
                session_id: snapshot.id,
                participant: participant.clone(),
            });
        }
    }

    /// Jackpot join window: countdown expiry moves the session to playing
    /// and arms the resolution deadline.
    fn start_countdown(self: &Arc<Self>, handle: &Arc<SessionHandle>) {
        let engine = Arc::clone(self);
        let session = Arc::clone(handle);
        let countdown = self.config.jackpot_countdown();

        let timer = tokio::spawn(async move {
            tokio::time::sleep(countdown).await;
            if session.begin_playing() {
                info!(session_id = %session.id, "countdown elapsed, session started");
                engine.broadcaster.publish(SessionEvent::Started {
                    session_id: session.id,
                });
                engine.start_resolution_timer(&session);
            }
        });
        handle.add_timer(timer);
    }

    /// Arm the deadline that guarantees forward progress once a session is
    /// playing. The timer hands resolution off to a fresh task so that
    /// cancelling the timer can never interrupt an in-flight resolution.
    fn start_resolution_timer(self: &Arc<Self>, handle: &Arc<SessionHandle>) {
        let engine = Arc::clone(self);
        let session = Arc::clone(handle);
        let deadline = self.config.resolve_deadline(handle.snapshot().game_type);

        let timer = tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            tokio::spawn(async move {
                engine.resolve(session).await;
            });
        });
        handle.add_timer(timer);
    }

    /// Resolve a session: compute the outcome, settle payouts, broadcast and
    /// schedule cleanup. Runs at most once per session; concurrent triggers
    /// (choice-complete and deadline) lose the guard and return silently.
    pub async fn resolve(self: &Arc<Self>, handle: Arc<SessionHandle>) {
        if !handle.try_begin_resolution() {
            return;
        }
        handle.cancel_timers();

        let state = handle.finalize_choices(self.draw.as_ref());
        if state.participants.is_empty() {
            // Nothing to resolve; drop the orphaned entry.
            self.registry.delete(handle.id);
            return;
        }

        let resolution = resolver::resolve(&state, self.draw.as_ref());
        let (payouts, fee) =
            settlement::compute_payouts(&state, &resolution.winner_id, self.config.fee_rate);
        let outcome = Outcome {
            winner_id: Some(resolution.winner_id.clone()),
            basis: resolution.basis,
            payouts: payouts.clone(),
            fee,
            settlement: None,
        };

        let completed = handle.record_outcome(outcome.clone());
        info!(
            session_id = %handle.id,
            winner = %resolution.winner_id,
            pool = completed.stake_pool(),
            fee,
            "session resolved"
        );
        self.broadcaster.publish(SessionEvent::Completed {
            session_id: handle.id,
            outcome,
        });

        let report = settlement::settle(
            &completed,
            &payouts,
            fee,
            &self.config.platform_address,
            self.transfer.as_ref(),
        )
        .await;
        if !report.fully_delivered() {
            warn!(session_id = %handle.id, "settlement incomplete; outcome stays final");
        }
        handle.attach_settlement(report);

        self.cleanup
            .schedule_removal(handle.id, self.config.cleanup_grace());
    }
}
