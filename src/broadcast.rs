//! Event fanout to session participants
//!
//! The engine publishes state-change events through [`SessionBroadcaster`];
//! the transport pushing them to connected clients lives outside the core.
//! Events for one session are published in lifecycle order (started before
//! completed); no ordering holds across sessions.

use crate::types::SessionEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Interface consumed by the state machine
pub trait SessionBroadcaster: Send + Sync {
    fn publish(&self, event: SessionEvent);
}

/// Fanout over a tokio broadcast channel; transports subscribe and filter by
/// session id.
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl SessionBroadcaster for ChannelBroadcaster {
    fn publish(&self, event: SessionEvent) {
        debug!(session_id = %event.session_id(), "publishing event");
        // A send error only means no transport is subscribed right now.
        let _ = self.sender.send(event);
    }
}

/// Discards events; used in tests that don't observe the stream
pub struct NoopBroadcaster;

impl SessionBroadcaster for NoopBroadcaster {
    fn publish(&self, _event: SessionEvent) {}
}
