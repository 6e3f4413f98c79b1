//! In-process event bus for queue updates.
//!
//! Provides a lightweight broadcast channel for UI subscriptions.

use tokio::sync::broadcast;

use crate::resolver::ResolutionOutcome;

/// Queue event payloads published by core services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueEvent {
    QueueChanged,
    ResolutionStarted {
        item_id: String,
    },
    ResolutionFinished {
        item_id: String,
        outcome: ResolutionOutcome,
    },
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<QueueEvent>,
}

impl EventBus {
    /// Create a new event bus with a bounded broadcast channel.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    /// Notify subscribers that the queue has changed.
    pub fn queue_changed(&self) {
        let _ = self.sender.send(QueueEvent::QueueChanged);
    }

    /// Notify subscribers that a provider call started for an item.
    pub fn resolution_started(&self, item_id: &str) {
        let _ = self.sender.send(QueueEvent::ResolutionStarted {
            item_id: item_id.to_string(),
        });
    }

    /// Notify subscribers that a provider call finished for an item.
    pub fn resolution_finished(&self, item_id: &str, outcome: ResolutionOutcome) {
        let _ = self.sender.send(QueueEvent::ResolutionFinished {
            item_id: item_id.to_string(),
            outcome,
        });
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
