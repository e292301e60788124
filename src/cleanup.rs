//! Post-completion cleanup
//!
//! One task per completed session sleeps out the grace window and removes
//! the session from the registry. Pending removals are cancellable at
//! shutdown; sessions are not persisted, so nothing survives a restart.

use crate::registry::SessionRegistry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

pub struct CleanupScheduler {
    registry: Arc<SessionRegistry>,
    pending: Arc<DashMap<Uuid, JoinHandle<()>>>,
}

impl CleanupScheduler {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Remove `session_id` from the registry after the grace window. Fires
    /// at most once per session; scheduling the same id again is a no-op.
    pub fn schedule_removal(&self, session_id: Uuid, after: Duration) {
        if self.pending.contains_key(&session_id) {
            return;
        }

        let registry = Arc::clone(&self.registry);
        let pending = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            registry.delete(session_id);
            pending.remove(&session_id);
            debug!(%session_id, "session removed after grace window");
        });

        self.pending.insert(session_id, handle);
    }

    /// Cancel a single pending removal (the session stays in the registry)
    pub fn cancel(&self, session_id: Uuid) {
        if let Some((_, handle)) = self.pending.remove(&session_id) {
            handle.abort();
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Abort every pending removal; used during process shutdown
    pub fn shutdown(&self) {
        let ids: Vec<Uuid> = self.pending.iter().map(|e| *e.key()).collect();
        for id in ids {
            self.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, GameType, Participant, PlayerProfile};

    fn seeded_registry() -> (Arc<SessionRegistry>, Uuid) {
        let registry = Arc::new(SessionRegistry::new());
        let handle = registry.create(
            GameType::Coinflip,
            1.0,
            Currency::sol(),
            Participant::new(
                PlayerProfile {
                    id: "a".to_string(),
                    display_name: "player-a".to_string(),
                    payout_address: "addr-a".to_string(),
                },
                1.0,
            ),
        );
        (registry, handle.id)
    }

    #[tokio::test]
    async fn test_removal_after_grace_window() {
        let (registry, id) = seeded_registry();
        let scheduler = CleanupScheduler::new(Arc::clone(&registry));

        scheduler.schedule_removal(id, Duration::from_millis(20));
        assert!(registry.contains(id));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!registry.contains(id));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_schedule_is_noop() {
        let (registry, id) = seeded_registry();
        let scheduler = CleanupScheduler::new(Arc::clone(&registry));

        scheduler.schedule_removal(id, Duration::from_millis(20));
        scheduler.schedule_removal(id, Duration::from_millis(20));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending() {
        let (registry, id) = seeded_registry();
        let scheduler = CleanupScheduler::new(Arc::clone(&registry));

        scheduler.schedule_removal(id, Duration::from_millis(30));
        scheduler.shutdown();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(registry.contains(id));
    }
}
