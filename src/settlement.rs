//! Payout settlement
//!
//! Computes per-participant payouts and the platform fee from a resolved
//! winner, then pushes transfers through the external [`TransferService`].
//! Settlement is attempted at most once per session; a failed transfer is
//! recorded and reported, never retried, and never re-resolves the game.

use crate::types::{Currency, DeliveryStatus, Session, SettlementReport};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

/// Transfer execution error from the external collaborator
#[derive(Debug, thiserror::Error)]
#[error("transfer failed: {0}")]
pub struct TransferError(pub String);

/// External wallet/chain transfer collaborator
#[async_trait]
pub trait TransferService: Send + Sync {
    /// Execute one transfer and return a transaction reference
    async fn transfer(
        &self,
        to_address: &str,
        amount: f64,
        currency: &Currency,
    ) -> Result<String, TransferError>;
}

/// Stand-in transfer service: logs the transfer and fabricates a reference.
/// Real wallet execution lives outside this process.
pub struct DryRunTransfer;

#[async_trait]
impl TransferService for DryRunTransfer {
    async fn transfer(
        &self,
        to_address: &str,
        amount: f64,
        currency: &Currency,
    ) -> Result<String, TransferError> {
        let tx_ref = format!("dryrun-{}", Uuid::new_v4());
        info!(to_address, amount, currency = %currency.symbol, %tx_ref, "dry-run transfer");
        Ok(tx_ref)
    }
}

/// Compute the payout table: the winner takes `pool * (1 - fee_rate)`, every
/// other participant gets zero, the platform keeps `pool * fee_rate`.
/// Payouts are never negative for any `fee_rate` in `[0, 1)`.
pub fn compute_payouts(
    session: &Session,
    winner_id: &str,
    fee_rate: f64,
) -> (HashMap<String, f64>, f64) {
    let pool = session.stake_pool();
    let fee = pool * fee_rate;
    let prize = pool - fee;

    let payouts = session
        .participants
        .iter()
        .map(|p| {
            let amount = if p.id == winner_id { prize } else { 0.0 };
            (p.id.clone(), amount)
        })
        .collect();

    (payouts, fee)
}

/// Push every non-zero payout plus the platform fee through the transfer
/// collaborator, recording per-participant delivery status.
pub async fn settle(
    session: &Session,
    payouts: &HashMap<String, f64>,
    fee: f64,
    platform_address: &str,
    transfer: &dyn TransferService,
) -> SettlementReport {
    let mut deliveries = HashMap::new();

    for participant in &session.participants {
        let amount = payouts.get(&participant.id).copied().unwrap_or(0.0);
        if amount <= 0.0 {
            continue;
        }
        let status = match transfer
            .transfer(&participant.payout_address, amount, &session.currency)
            .await
        {
            Ok(tx_ref) => DeliveryStatus::Delivered { tx_ref },
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    participant_id = %participant.id,
                    amount,
                    error = %e,
                    "payout transfer failed"
                );
                DeliveryStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        deliveries.insert(participant.id.clone(), status);
    }

    let fee_delivery = if fee > 0.0 {
        match transfer
            .transfer(platform_address, fee, &session.currency)
            .await
        {
            Ok(tx_ref) => DeliveryStatus::Delivered { tx_ref },
            Err(e) => {
                warn!(session_id = %session.id, fee, error = %e, "fee transfer failed");
                DeliveryStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    } else {
        DeliveryStatus::Delivered {
            tx_ref: "fee-zero".to_string(),
        }
    };

    SettlementReport {
        deliveries,
        fee_delivery,
    }
}
