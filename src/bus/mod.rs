//! Event bus for inter-component communication
//!
//! Uses tokio::sync::broadcast for pub/sub pattern.
//! Action results and integration lifecycle changes are published here and
//! picked up by the SSE stream and the MQTT bridge.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event types that can be published on the bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BusEvent {
    // Integration lifecycle
    IntegrationReady { server: String },
    IntegrationUnloaded,

    // Action results
    SpeakerControlled {
        speaker_id: String,
        command: String,
        success: bool,
    },
    ContentPlayed {
        speaker_id: String,
        query: String,
        content_type: String,
        success: bool,
    },
}

impl BusEvent {
    /// Speaker the event concerns, if any
    pub fn speaker_id(&self) -> Option<&str> {
        match self {
            BusEvent::SpeakerControlled { speaker_id, .. }
            | BusEvent::ContentPlayed { speaker_id, .. } => Some(speaker_id),
            _ => None,
        }
    }
}

/// Event bus handle for publishing and subscribing
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusEvent>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: BusEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events
    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    /// Default capacity (256 events)
    fn default() -> Self {
        Self::new(256)
    }
}

/// Shared event bus wrapped in Arc for thread-safe sharing
pub type SharedBus = Arc<EventBus>;

/// Create a new shared event bus
pub fn create_bus() -> SharedBus {
    Arc::new(EventBus::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pubsub() {
        let bus = create_bus();
        let mut rx = bus.subscribe();

        bus.publish(BusEvent::IntegrationReady {
            server: "http://ma.local:8095".to_string(),
        });

        let event = rx.recv().await.unwrap();
        match event {
            BusEvent::IntegrationReady { server } => {
                assert_eq!(server, "http://ma.local:8095");
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = create_bus();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(BusEvent::IntegrationUnloaded);

        assert!(matches!(rx1.recv().await.unwrap(), BusEvent::IntegrationUnloaded));
        assert!(matches!(rx2.recv().await.unwrap(), BusEvent::IntegrationUnloaded));
    }

    #[test]
    fn test_event_serializes_tagged() {
        let event = BusEvent::SpeakerControlled {
            speaker_id: "kitchen".to_string(),
            command: "play".to_string(),
            success: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SpeakerControlled");
        assert_eq!(json["payload"]["speaker_id"], "kitchen");
        assert_eq!(event.speaker_id(), Some("kitchen"));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = create_bus();
        bus.publish(BusEvent::IntegrationUnloaded);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
