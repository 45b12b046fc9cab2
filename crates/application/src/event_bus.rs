use std::sync::Arc;

use async_trait::async_trait;
use quire_domain::FrameworkEvent;
use serde_json::Value;
use tracing::debug;

/// Named event with an optional structured payload. Immutable once broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent {
    name: String,
    payload: Option<Value>,
}

impl DomainEvent {
    /// Creates an event.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the payload, if one was broadcast.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

/// Catch-all event subscriber.
///
/// Every subscriber receives every event and ignores names it does not handle.
/// Subscribers absorb their own failures; nothing is reported back to the broadcaster.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Processes one event.
    async fn handle(&self, event: &DomainEvent);
}

/// Collects subscribers before the bus is shared.
#[derive(Default)]
pub struct EventBusBuilder {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl EventBusBuilder {
    /// Creates a builder without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. Delivery follows registration order.
    #[must_use]
    pub fn subscribe(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Freezes the subscriber list.
    #[must_use]
    pub fn build(self) -> EventBus {
        EventBus {
            subscribers: self.subscribers,
        }
    }
}

/// In-process publish/subscribe broadcaster with a fixed subscriber list.
pub struct EventBus {
    subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl EventBus {
    /// Delivers an event to every subscriber in registration order.
    ///
    /// Returns once each subscriber has processed the event.
    pub async fn broadcast(&self, name: impl Into<String>, payload: Option<Value>) {
        let event = DomainEvent::new(name, payload);
        debug!(
            event = event.name(),
            subscribers = self.subscribers.len(),
            "broadcasting event"
        );

        for subscriber in &self.subscribers {
            subscriber.handle(&event).await;
        }
    }

    /// Broadcasts a well-known framework event.
    pub async fn publish(&self, event: FrameworkEvent, payload: Option<Value>) {
        self.broadcast(event.as_str(), payload).await;
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
