//! Store change notifications
//!
//! Every committed mutation is announced on an [`EventBus`] so front ends can
//! re-render the affected slice.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Namespace of a store module inside the root state tree
///
/// The enum is closed, so two modules can never share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKey {
    Auth,
    Config,
    Series,
    User,
}

impl ModuleKey {
    /// All keys in state-tree order
    pub const ALL: [ModuleKey; 4] = [
        ModuleKey::Auth,
        ModuleKey::Config,
        ModuleKey::Series,
        ModuleKey::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Auth => "auth",
            ModuleKey::Config => "config",
            ModuleKey::Series => "series",
            ModuleKey::User => "user",
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A mutation was committed to a store module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    /// Module whose state changed
    pub module: ModuleKey,
    /// Name of the committed mutation, e.g. `receive_series_list`
    pub mutation: String,
    /// When the mutation was applied
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StoreEvent {
    pub fn now(module: ModuleKey, mutation: impl Into<String>) -> Self {
        Self {
            module,
            mutation: mutation.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Broadcast channel for store events
///
/// Uses tokio::broadcast internally:
/// - Publishing never blocks (slow subscribers lag and lose old events)
/// - Any number of subscribers
/// - Publishing with no subscribers is not an error
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: StoreEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(StoreEvent::now(ModuleKey::Series, "receive_series_list"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.module, ModuleKey::Series);
        assert_eq!(event.mutation, "receive_series_list");
    }

    #[test]
    fn test_emit_without_subscribers_is_ok() {
        let bus = EventBus::new(4);
        bus.emit_lossy(StoreEvent::now(ModuleKey::Auth, "logout"));
        assert_eq!(bus.capacity(), 4);
    }

    #[test]
    fn test_module_keys_are_distinct() {
        let mut names: Vec<&str> = ModuleKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ModuleKey::ALL.len());
    }
}
