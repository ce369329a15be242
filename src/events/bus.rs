//! Event bus for broadcasting graph change events

use super::{EventEmitter, GraphEvent};
use tokio::sync::broadcast;
use tracing::debug;

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 1024;

/// Event bus that distributes GraphEvents via `tokio::sync::broadcast`
///
/// Fire-and-forget: emitting never blocks, never panics, and needs no
/// async runtime. If no subscribers are connected, events are dropped.
/// Slow subscribers lag rather than stall the store.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GraphEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to receive events
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventEmitter for EventBus {
    fn emit(&self, event: GraphEvent) {
        let entity = event.entity;
        let action = event.action;
        if let Ok(n) = self.sender.send(event) {
            debug!(
                entity = ?entity,
                action = ?action,
                subscribers = n,
                "GraphEvent emitted"
            );
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
