//! Outcome resolution
//!
//! Pure functions from a session's participants (and a random draw) to a
//! winner. Randomness comes through [`DrawSource`] so production uses an
//! OS-backed generator while tests inject a seeded one; it is never derived
//! from client-supplied data.

use crate::types::{CoinSide, Participant, ResolutionBasis, Session};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Injectable source of randomness for outcome selection
pub trait DrawSource: Send + Sync {
    /// Uniform coin toss
    fn coin(&self) -> CoinSide;
    /// Uniform draw in `[0, 1)`
    fn unit(&self) -> f64;
    /// Uniform index in `[0, n)`
    fn pick(&self, n: usize) -> usize;
}

/// Production draw source backed by the thread-local OS-seeded generator
pub struct ThreadDraw;

impl DrawSource for ThreadDraw {
    fn coin(&self) -> CoinSide {
        if rand::thread_rng().gen_bool(0.5) {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }

    fn unit(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn pick(&self, n: usize) -> usize {
        rand::thread_rng().gen_range(0..n)
    }
}

/// Deterministic draw source for tests
pub struct SeededDraw {
    rng: Mutex<StdRng>,
}

impl SeededDraw {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl DrawSource for SeededDraw {
    fn coin(&self) -> CoinSide {
        if self.rng.lock().unwrap().gen_bool(0.5) {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }

    fn unit(&self) -> f64 {
        self.rng.lock().unwrap().gen::<f64>()
    }

    fn pick(&self, n: usize) -> usize {
        self.rng.lock().unwrap().gen_range(0..n)
    }
}

/// Winner selection result, before payouts are computed
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub winner_id: String,
    pub basis: ResolutionBasis,
}

/// Resolve a session to a winner. Deterministic given the draw source.
/// Callers must ensure choices were defaulted first where the game type
/// requires them.
pub fn resolve(session: &Session, draw: &dyn DrawSource) -> Resolution {
    match session.game_type {
        crate::types::GameType::Coinflip => resolve_coinflip(&session.participants, draw),
        crate::types::GameType::Jackpot => resolve_jackpot(&session.participants, draw),
    }
}

/// Toss a coin; the participant whose choice matches wins. If zero or more
/// than one participant matches, fall back to a uniform pick among everyone
/// so the game never produces zero winners.
fn resolve_coinflip(participants: &[Participant], draw: &dyn DrawSource) -> Resolution {
    let landed = draw.coin();
    let matching: Vec<&Participant> = participants
        .iter()
        .filter(|p| p.choice == Some(landed))
        .collect();

    if matching.len() == 1 {
        return Resolution {
            winner_id: matching[0].id.clone(),
            basis: ResolutionBasis::CoinToss { landed },
        };
    }

    let index = draw.pick(participants.len());
    Resolution {
        winner_id: participants[index].id.clone(),
        basis: ResolutionBasis::RandomPick { index },
    }
}

/// Single uniform ticket over the cumulative-stake interval: a participant
/// contributing fraction `f` of the pool wins with probability `f`.
fn resolve_jackpot(participants: &[Participant], draw: &dyn DrawSource) -> Resolution {
    let pool: f64 = participants.iter().map(|p| p.stake).sum();
    let ticket = draw.unit() * pool;
    let winner = winner_for_ticket(participants, ticket);

    Resolution {
        winner_id: winner.id.clone(),
        basis: ResolutionBasis::WeightedTicket { ticket, pool },
    }
}

/// Walk the cumulative-stake interval to the participant owning `ticket`.
/// Reproducing the winner from a retained [`ResolutionBasis::WeightedTicket`]
/// uses this same walk.
pub fn winner_for_ticket(participants: &[Participant], ticket: f64) -> &Participant {
    let mut cumulative = 0.0;
    for participant in participants {
        cumulative += participant.stake;
        if ticket < cumulative {
            return participant;
        }
    }
    // ticket == pool can only happen through float rounding; the last
    // interval absorbs it.
    participants
        .last()
        .expect("resolution requires at least one participant")
}
