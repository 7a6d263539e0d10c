//! Domain event system: lets the CLI (or anything else) follow a run
//! without coupling to the orchestration loop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::observation::Outcome;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A new round started; the model is about to be called
    RoundStarted {
        conversation_id: String,
        round: u32,
        timestamp: DateTime<Utc>,
    },

    /// The model answered
    AssistantReplied {
        round: u32,
        content: String,
        action_count: usize,
        tokens_used: Option<u32>,
        timestamp: DateTime<Utc>,
    },

    /// One action request was handled
    ActionDispatched {
        round: u32,
        correlation_id: String,
        action: String,
        arguments: String,
        outcome: Outcome,
        observation: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The model requested nothing
    IdleRound {
        round: u32,
        consecutive: u32,
        threshold: u32,
        timestamp: DateTime<Utc>,
    },

    /// The run ended
    RunTerminated {
        conversation_id: String,
        rounds: u32,
        reason: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ActionDispatched {
            round: 1,
            correlation_id: "call_1".into(),
            action: "list_files".into(),
            arguments: r#"{"folder":"."}"#.into(),
            outcome: Outcome::Success,
            observation: "main.tf".into(),
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ActionDispatched { action, outcome, .. } => {
                assert_eq!(action, "list_files");
                assert!(outcome.is_success());
            }
            _ => panic!("Expected ActionDispatched event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::IdleRound {
            round: 1,
            consecutive: 1,
            threshold: 2,
            timestamp: Utc::now(),
        });
    }
}
