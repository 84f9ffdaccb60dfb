//! In-process event bus.
//!
//! Carries server push events from the realtime listener to app
//! subscriptions, and app-published intents to whoever listens.
//! Topics are plain strings; payloads are JSON values.

use once_cell::sync::Lazy;
use serde_json::Value;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct BusEvent {
    pub topic: String,
    pub data: Value,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, topic: impl Into<String>, data: Value) {
        let event = BusEvent {
            topic: topic.into(),
            data,
        };
        log::debug!("Bus publish: {}", event.topic);
        // Send only fails when nobody is subscribed, which is fine.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}

static EVENT_BUS: Lazy<EventBus> = Lazy::new(|| EventBus::new(64));

/// Process-wide event bus shared by the runtime and the realtime
/// listener.
pub fn event_bus() -> &'static EventBus {
    &EVENT_BUS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish("report_generated", serde_json::json!({"name": "PR-0001"}));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic, "report_generated");
        assert_eq!(event.data["name"], "PR-0001");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(8);
        bus.publish("nobody-listens", Value::Null);
    }
}
