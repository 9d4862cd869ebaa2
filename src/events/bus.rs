//! Per-kind fan-out of queue events to independent listeners.
//!
//! Every subscription gets its own worker task fed by an unbounded channel, so
//! a listener sees events in publication order while a slow listener never
//! holds up the publisher or any other listener. Each delivery runs in its own
//! task: errors are logged, panics are contained, nothing is retried.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::{EventKind, QueueEvent};
use crate::error::ListenerError;

/// Reactive consumer of queue events.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn on_event(&self, event: &QueueEvent) -> Result<(), ListenerError>;
}

#[derive(Clone)]
struct Subscription {
    name: String,
    sender: UnboundedSender<QueueEvent>,
}

/// Cheap to clone; all clones share one registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<HashMap<EventKind, Vec<Subscription>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `kinds`. Must be called inside a tokio runtime.
    pub fn subscribe(&self, kinds: &[EventKind], listener: Arc<dyn Listener>) {
        let (sender, receiver) = unbounded_channel();
        let subscription = Subscription {
            name: listener.name().to_string(),
            sender,
        };

        {
            let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());
            for kind in kinds {
                registry.entry(*kind).or_default().push(subscription.clone());
            }
        }

        tracing::debug!("Listener {} subscribed to {:?}", subscription.name, kinds);
        tokio::spawn(run_worker(listener, receiver));
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Hand events to their listeners. Never blocks and never fails.
    pub fn publish(&self, events: Vec<QueueEvent>) {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        for event in events {
            tracing::debug!("Publishing event {:?}", event);
            let Some(subscriptions) = registry.get(&event.kind()) else {
                continue;
            };
            for subscription in subscriptions {
                if subscription.sender.send(event.clone()).is_err() {
                    tracing::warn!(
                        "Listener {} is gone, dropped {} event",
                        subscription.name,
                        event.kind()
                    );
                }
            }
        }
    }
}

async fn run_worker(listener: Arc<dyn Listener>, mut receiver: UnboundedReceiver<QueueEvent>) {
    while let Some(event) = receiver.recv().await {
        let kind = event.kind();
        let task_listener = listener.clone();
        let outcome = tokio::spawn(async move { task_listener.on_event(&event).await }).await;

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Listener {} failed on {} event: {}", listener.name(), kind, e);
            }
            Err(e) if e.is_panic() => {
                tracing::error!("Listener {} panicked on {} event", listener.name(), kind);
            }
            Err(e) => {
                tracing::warn!("Listener {} was cancelled on {} event: {}", listener.name(), kind, e);
            }
        }
    }
    tracing::debug!("Listener {} worker stopped", listener.name());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ParticipantRemoved, SecondInLineChanged};
    use crate::testing::RecordingListener;
    use std::time::Duration;

    fn second(id: &str) -> QueueEvent {
        QueueEvent::SecondInLineChanged(SecondInLineChanged {
            current: id.to_string(),
        })
    }

    fn removed(id: &str) -> QueueEvent {
        QueueEvent::ParticipantRemoved(ParticipantRemoved {
            actor: "admin".to_string(),
            removed: id.to_string(),
        })
    }

    struct Panicking;

    #[async_trait]
    impl Listener for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn on_event(&self, _event: &QueueEvent) -> Result<(), ListenerError> {
            panic!("listener blew up");
        }
    }

    #[tokio::test]
    async fn test_routes_by_kind() {
        let bus = EventBus::new();
        let seconds = RecordingListener::new();
        let removals = RecordingListener::new();
        bus.subscribe(&[EventKind::SecondInLineChanged], seconds.clone());
        bus.subscribe(&[EventKind::ParticipantRemoved], removals.clone());

        bus.publish(vec![second("b"), removed("a")]);

        assert_eq!(seconds.next().await, second("b"));
        assert_eq!(removals.next().await, removed("a"));
        assert!(seconds.is_quiet().await);
        assert!(removals.is_quiet().await);
    }

    #[tokio::test]
    async fn test_preserves_order_per_listener() {
        let bus = EventBus::new();
        let all = RecordingListener::new();
        bus.subscribe(&EventKind::ALL, all.clone());

        bus.publish(vec![removed("a"), second("b"), removed("c")]);

        assert_eq!(all.next().await, removed("a"));
        assert_eq!(all.next().await, second("b"));
        assert_eq!(all.next().await, removed("c"));
    }

    #[tokio::test]
    async fn test_panicking_listener_is_isolated() {
        crate::logging::init_test();
        let bus = EventBus::new();
        let recorder = RecordingListener::new();
        bus.subscribe(&[EventKind::SecondInLineChanged], Arc::new(Panicking));
        bus.subscribe(&[EventKind::SecondInLineChanged], recorder.clone());

        bus.publish(vec![second("b")]);
        bus.publish(vec![second("c")]);

        assert_eq!(recorder.next().await, second("b"));
        assert_eq!(recorder.next().await, second("c"));
        assert_eq!(bus.subscriber_count(EventKind::SecondInLineChanged), 2);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(vec![second("b")]);
        assert_eq!(bus.subscriber_count(EventKind::HolderChanged), 0);
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
}
