//! End-to-end engine tests: full session lifecycles, resolve-once under
//! racing triggers, payout balancing, and cleanup timing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wagerhall::broadcast::{ChannelBroadcaster, NoopBroadcaster};
use wagerhall::config::EngineConfig;
use wagerhall::engine::GameEngine;
use wagerhall::errors::GameError;
use wagerhall::resolver::SeededDraw;
use wagerhall::settlement::{TransferError, TransferService};
use wagerhall::types::{
    CoinSide, Currency, GameType, PlayerProfile, SessionEvent, SessionStatus,
};

struct CountingTransfer {
    calls: AtomicUsize,
}

impl CountingTransfer {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TransferService for CountingTransfer {
    async fn transfer(
        &self,
        _to_address: &str,
        _amount: f64,
        _currency: &Currency,
    ) -> Result<String, TransferError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("tx-{}", n))
    }
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        coinflip_resolve_ms: 60,
        jackpot_countdown_ms: 50,
        jackpot_resolve_ms: 30,
        cleanup_grace_ms: 80,
        ..EngineConfig::default()
    }
}

fn profile(id: &str) -> PlayerProfile {
    PlayerProfile {
        id: id.to_string(),
        display_name: format!("player-{}", id),
        payout_address: format!("addr-{}", id),
    }
}

#[tokio::test]
async fn coinflip_lifecycle_events_in_order() {
    let broadcaster = Arc::new(ChannelBroadcaster::new(64));
    let mut events = broadcaster.subscribe();
    let engine = GameEngine::new(
        fast_config(),
        broadcaster.clone(),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(5)),
    );

    let session = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();
    engine
        .submit_choice(session.id, "a", CoinSide::Heads)
        .await
        .unwrap();
    engine
        .submit_choice(session.id, "b", CoinSide::Tails)
        .await
        .unwrap();

    let mut kinds = Vec::new();
    for _ in 0..6 {
        let event = events.recv().await.unwrap();
        assert_eq!(event.session_id(), session.id);
        kinds.push(match event {
            SessionEvent::Created { .. } => "created",
            SessionEvent::ParticipantJoined { .. } => "joined",
            SessionEvent::Started { .. } => "started",
            SessionEvent::ChoiceAccepted { .. } => "choice",
            SessionEvent::Completed { .. } => "completed",
        });
    }
    assert_eq!(
        kinds,
        vec!["created", "joined", "started", "choice", "choice", "completed"]
    );
}

#[tokio::test]
async fn opposing_choices_resolve_immediately_with_balanced_payouts() {
    let transfer = CountingTransfer::new();
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        transfer.clone(),
        Arc::new(SeededDraw::new(21)),
    );

    let session = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();
    engine
        .submit_choice(session.id, "a", CoinSide::Heads)
        .await
        .unwrap();
    let resolved = engine
        .submit_choice(session.id, "b", CoinSide::Tails)
        .await
        .unwrap();

    // Resolution happened on the choice-complete path, not the deadline.
    assert_eq!(resolved.status, SessionStatus::Completed);

    let outcome = resolved.outcome.expect("completed session has an outcome");
    let winner = outcome.winner_id.clone().unwrap();
    assert!((outcome.payouts[&winner] - 2.0 * 0.9).abs() < 1e-9);
    let loser_total: f64 = outcome
        .payouts
        .iter()
        .filter(|(id, _)| **id != winner)
        .map(|(_, v)| *v)
        .sum();
    assert_eq!(loser_total, 0.0);

    let total: f64 = outcome.payouts.values().sum();
    assert!((total + outcome.fee - 2.0).abs() < 1e-9);

    // Winner payout plus platform fee: exactly two transfers.
    assert_eq!(transfer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn racing_triggers_settle_exactly_once() {
    let transfer = CountingTransfer::new();
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        transfer.clone(),
        Arc::new(SeededDraw::new(33)),
    );

    let session = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();

    // Fire many manual triggers while the deadline timer is armed.
    let handle = engine.registry().get(session.id).unwrap();
    let mut tasks = Vec::new();
    for _ in 0..32 {
        let engine = Arc::clone(&engine);
        let handle = Arc::clone(&handle);
        tasks.push(tokio::spawn(async move {
            engine.resolve(handle).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    // Let the deadline timer fire too (it must lose the guard silently).
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(transfer.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn jackpot_deadline_draws_weighted_winner() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(17)),
    );

    let session = engine
        .create_or_join(GameType::Jackpot, 1.0, Currency::usdt(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Jackpot, 2.0, Currency::usdt(), profile("b"))
        .unwrap();
    engine
        .create_or_join(GameType::Jackpot, 7.0, Currency::usdt(), profile("c"))
        .unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;

    let resolved = engine.session(session.id).unwrap();
    assert_eq!(resolved.status, SessionStatus::Completed);

    let outcome = resolved.outcome.unwrap();
    match outcome.basis {
        wagerhall::types::ResolutionBasis::WeightedTicket { ticket, pool } => {
            assert!((pool - 10.0).abs() < 1e-9);
            assert!(ticket >= 0.0 && ticket < pool);
        }
        other => panic!("expected WeightedTicket, got {:?}", other),
    }

    let winner = outcome.winner_id.unwrap();
    assert!((outcome.payouts[&winner] - 9.0).abs() < 1e-9);
    let total: f64 = outcome.payouts.values().sum();
    assert!((total + outcome.fee - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn jackpot_sessions_with_different_stakes_share_a_pool() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(2)),
    );

    let first = engine
        .create_or_join(GameType::Jackpot, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    let second = engine
        .create_or_join(GameType::Jackpot, 5.0, Currency::sol(), profile("b"))
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.participants.len(), 2);
    assert_eq!(second.stake_pool(), 6.0);
}

#[tokio::test]
async fn full_coinflip_rejects_third_join() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(4)),
    );

    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();
    // Third player cannot land in the started session; matchmaking opens a
    // fresh one instead.
    let third = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("c"))
        .unwrap();
    assert_eq!(third.participants.len(), 1);

    // A direct join attempt against the started session is rejected.
    let handles = engine.registry().handles();
    let started = handles
        .iter()
        .find(|h| h.snapshot().status == SessionStatus::Playing)
        .unwrap();
    match started.try_join(wagerhall::types::Participant::new(profile("d"), 1.0)) {
        Err(GameError::InvalidTransition { .. }) | Err(GameError::CapacityExceeded(_)) => {}
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn completed_session_rejects_choices_then_disappears() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(8)),
    );

    let session = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();
    engine
        .submit_choice(session.id, "a", CoinSide::Heads)
        .await
        .unwrap();
    engine
        .submit_choice(session.id, "b", CoinSide::Tails)
        .await
        .unwrap();

    match engine.submit_choice(session.id, "a", CoinSide::Tails).await {
        Err(GameError::InvalidTransition { .. }) => {}
        other => panic!("expected InvalidTransition, got {:?}", other),
    }

    // Queryable within the grace window, gone within a bounded margin after.
    assert!(engine.session(session.id).is_ok());
    tokio::time::sleep(Duration::from_millis(200)).await;
    match engine.session(session.id) {
        Err(GameError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }

    match engine.submit_choice(session.id, "a", CoinSide::Heads).await {
        Err(GameError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn discarded_session_rejects_joins_through_stale_handles() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(6)),
    );

    let session = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    // A matchmaking scan can hold on to the handle across the discard below.
    let stale = engine.registry().get(session.id).unwrap();

    engine.leave(session.id, "a").unwrap();

    // The stale handle must not accept a join into the deleted session.
    match stale.try_join(wagerhall::types::Participant::new(profile("b"), 1.0)) {
        Err(GameError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }

    // A fresh matchmaking attempt lands in a brand-new session instead.
    let second = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();
    assert_ne!(second.id, session.id);
    assert_eq!(second.participants.len(), 1);
    assert!(engine.session(second.id).is_ok());
}

#[tokio::test]
async fn unresponsive_participant_does_not_stall_resolution() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(12)),
    );

    let session = engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("a"))
        .unwrap();
    engine
        .create_or_join(GameType::Coinflip, 1.0, Currency::sol(), profile("b"))
        .unwrap();
    // Only one participant acts; the other never responds.
    engine
        .submit_choice(session.id, "a", CoinSide::Heads)
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;

    let resolved = engine.session(session.id).unwrap();
    assert_eq!(resolved.status, SessionStatus::Completed);
    let defaulted = resolved.participant("b").unwrap();
    assert!(defaulted.choice.is_some());
}

#[tokio::test]
async fn independent_sessions_do_not_interfere() {
    let engine = GameEngine::new(
        fast_config(),
        Arc::new(NoopBroadcaster),
        CountingTransfer::new(),
        Arc::new(SeededDraw::new(19)),
    );

    // Distinct stakes produce distinct sessions that run side by side.
    let mut ids = Vec::new();
    for i in 0..10 {
        let stake = 1.0 + f64::from(i);
        let s = engine
            .create_or_join(
                GameType::Coinflip,
                stake,
                Currency::sol(),
                profile(&format!("a{}", i)),
            )
            .unwrap();
        engine
            .create_or_join(
                GameType::Coinflip,
                stake,
                Currency::sol(),
                profile(&format!("b{}", i)),
            )
            .unwrap();
        ids.push((s.id, stake));
    }

    for (idx, (id, _)) in ids.iter().enumerate() {
        let a = format!("a{}", idx);
        let b = format!("b{}", idx);
        engine.submit_choice(*id, &a, CoinSide::Heads).await.unwrap();
        engine.submit_choice(*id, &b, CoinSide::Tails).await.unwrap();
    }

    for (id, stake) in ids {
        let resolved = engine.session(id).unwrap();
        assert_eq!(resolved.status, SessionStatus::Completed);
        let outcome = resolved.outcome.unwrap();
        let total: f64 = outcome.payouts.values().sum();
        assert!((total + outcome.fee - 2.0 * stake).abs() < 1e-9);
    }
}
