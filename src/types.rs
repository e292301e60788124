use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Coinflip,
    Jackpot,
    // Future games: KolPredictor, MarketMaster
}

impl GameType {
    /// Maximum participants, or `None` when joins are bounded only by the
    /// countdown window.
    pub fn capacity(&self) -> Option<usize> {
        match self {
            GameType::Coinflip => Some(2),
            GameType::Jackpot => None,
        }
    }

    /// Whether participants are expected to submit a choice before resolution.
    pub fn requires_choice(&self) -> bool {
        matches!(self, GameType::Coinflip)
    }

    /// Whether every participant must wager the session's stake. Jackpot
    /// participants each contribute their own amount to the pool.
    pub fn uniform_stake(&self) -> bool {
        matches!(self, GameType::Coinflip)
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Coinflip => write!(f, "coinflip"),
            GameType::Jackpot => write!(f, "jackpot"),
        }
    }
}

/// Wagering currency with optional mint address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Currency {
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_address: Option<String>,
}

impl Currency {
    /// Native SOL
    pub fn sol() -> Self {
        Self {
            symbol: "SOL".to_string(),
            mint_address: None,
        }
    }

    /// USDT SPL token
    pub fn usdt() -> Self {
        Self {
            symbol: "USDT".to_string(),
            mint_address: Some("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB".to_string()),
        }
    }
}

/// Coin flip choice
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => write!(f, "heads"),
            CoinSide::Tails => write!(f, "tails"),
        }
    }
}

/// Session lifecycle status; transitions only move forward
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Waiting => write!(f, "waiting"),
            SessionStatus::Playing => write!(f, "playing"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Identity supplied by the external identity provider at join time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: String,
    pub display_name: String,
    pub payout_address: String,
}

/// One participant of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
    pub payout_address: String,
    /// Amount wagered by this participant. Equals the session stake for
    /// coinflip; may differ per participant in a jackpot.
    pub stake: f64,
    /// Set by the player, or defaulted at the resolution deadline
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choice: Option<CoinSide>,
}

impl Participant {
    pub fn new(profile: PlayerProfile, stake: f64) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
            payout_address: profile.payout_address,
            stake,
            choice: None,
        }
    }
}

/// The random draw that produced the winner, retained for audit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionBasis {
    /// What the coin landed on
    CoinToss { landed: CoinSide },
    /// Uniform ticket over the cumulative-stake interval `[0, pool)`
    WeightedTicket { ticket: f64, pool: f64 },
    /// Fallback pick when choices did not produce a unique winner
    RandomPick { index: usize },
}

/// Delivery status of one settlement transfer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeliveryStatus {
    Delivered { tx_ref: String },
    Failed { reason: String },
}

/// Per-participant transfer results recorded after settlement is attempted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReport {
    pub deliveries: HashMap<String, DeliveryStatus>,
    pub fee_delivery: DeliveryStatus,
}

impl SettlementReport {
    /// True when every payout and the platform fee went through
    pub fn fully_delivered(&self) -> bool {
        matches!(self.fee_delivery, DeliveryStatus::Delivered { .. })
            && self
                .deliveries
                .values()
                .all(|d| matches!(d, DeliveryStatus::Delivered { .. }))
    }
}

/// Resolved result of a session; computed exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub winner_id: Option<String>,
    pub basis: ResolutionBasis,
    /// participant id -> amount; sums to `pool * (1 - fee_rate)`
    pub payouts: HashMap<String, f64>,
    pub fee: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementReport>,
}

/// One instance of a wagering game from creation to cleanup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub game_type: GameType,
    pub stake_amount: f64,
    pub currency: Currency,
    pub status: SessionStatus,
    pub participants: Vec<Participant>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl Session {
    pub fn new(
        game_type: GameType,
        stake_amount: f64,
        currency: Currency,
        first: Participant,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_type,
            stake_amount,
            currency,
            status: SessionStatus::Waiting,
            participants: vec![first],
            created_at: Utc::now().timestamp_millis(),
            outcome: None,
        }
    }

    /// Total wagered amount across all participants
    pub fn stake_pool(&self) -> f64 {
        self.participants.iter().map(|p| p.stake).sum()
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    /// Whether another participant fits under the game-type capacity
    pub fn has_room(&self) -> bool {
        match self.game_type.capacity() {
            Some(cap) => self.participants.len() < cap,
            None => true,
        }
    }

    /// Start condition for the waiting -> playing transition
    pub fn capacity_filled(&self) -> bool {
        match self.game_type.capacity() {
            Some(cap) => self.participants.len() >= cap,
            None => false,
        }
    }

    /// All required choices are in (jackpot requires none, so this only
    /// signals readiness for choice-driven games)
    pub fn all_choices_in(&self) -> bool {
        self.game_type.requires_choice() && self.participants.iter().all(|p| p.choice.is_some())
    }
}

/// State-change events published to session participants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    Created {
        session: Session,
    },
    ParticipantJoined {
        session_id: Uuid,
        participant: Participant,
    },
    Started {
        session_id: Uuid,
    },
    ChoiceAccepted {
        session_id: Uuid,
        participant_id: String,
    },
    Completed {
        session_id: Uuid,
        outcome: Outcome,
    },
}

impl SessionEvent {
    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::Created { session } => session.id,
            SessionEvent::ParticipantJoined { session_id, .. } => *session_id,
            SessionEvent::Started { session_id } => *session_id,
            SessionEvent::ChoiceAccepted { session_id, .. } => *session_id,
            SessionEvent::Completed { session_id, .. } => *session_id,
        }
    }
}
