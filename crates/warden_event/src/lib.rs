//! # warden_event - Gameplay Signal Bus
//!
//! Publish/subscribe plumbing for the four gameplay signals agents care
//! about: Alert, Hide, UnHide and TargetLost. The bus is injected into each
//! agent at construction - there is no ambient singleton. Publishing is
//! fire-and-forget and never blocks: every subscriber gets its own
//! unbounded channel, and a publish with zero subscribers is a no-op.

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use warden_math::Vec3;

/// Signal topics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Target sighted - raises pursuit urgency agent-wide
    Alert,
    /// Target became concealed
    Hide,
    /// Target came out of concealment
    UnHide,
    /// Target was explicitly lost
    TargetLost,
}

/// A gameplay signal delivered through the bus
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// Target sighted, optionally carrying its last known position
    Alert { target: Option<Vec3> },
    /// Target became concealed
    Hide,
    /// Target came out of concealment
    UnHide,
    /// Target was explicitly lost
    TargetLost,
}

impl Signal {
    /// Topic this signal is delivered on
    pub fn topic(&self) -> Topic {
        match self {
            Signal::Alert { .. } => Topic::Alert,
            Signal::Hide => Topic::Hide,
            Signal::UnHide => Topic::UnHide,
            Signal::TargetLost => Topic::TargetLost,
        }
    }
}

/// Bus for publishing and subscribing to gameplay signals
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<Topic, Vec<Sender<Signal>>>>,
}

impl EventBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic, receiving every future signal published on it
    pub fn subscribe(&self, topic: Topic) -> Receiver<Signal> {
        let (tx, rx) = unbounded();
        self.subscribers.write().entry(topic).or_default().push(tx);
        rx
    }

    /// Publish a signal to all current subscribers of its topic.
    ///
    /// Subscribers whose receiving end has been dropped are pruned here.
    pub fn publish(&self, signal: Signal) {
        let mut subscribers = self.subscribers.write();
        if let Some(senders) = subscribers.get_mut(&signal.topic()) {
            senders.retain(|tx| tx.send(signal).is_ok());
        }
    }

    /// Number of live subscribers on a topic
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers
            .read()
            .get(&topic)
            .map_or(0, |senders| senders.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(Signal::Hide); // must not block or panic
        assert_eq!(bus.subscriber_count(Topic::Hide), 0);
    }

    #[test]
    fn test_fan_out() {
        let bus = EventBus::new();
        let a = bus.subscribe(Topic::Alert);
        let b = bus.subscribe(Topic::Alert);

        let pos = Vec3::new(1.0, 0.0, 2.0);
        bus.publish(Signal::Alert { target: Some(pos) });

        assert_eq!(a.try_recv().unwrap(), Signal::Alert { target: Some(pos) });
        assert_eq!(b.try_recv().unwrap(), Signal::Alert { target: Some(pos) });
    }

    #[test]
    fn test_topic_filtering() {
        let bus = EventBus::new();
        let hide_rx = bus.subscribe(Topic::Hide);

        bus.publish(Signal::TargetLost);
        bus.publish(Signal::Hide);

        assert_eq!(hide_rx.try_recv().unwrap(), Signal::Hide);
        assert!(hide_rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_pruned() {
        let bus = EventBus::new();
        let rx = bus.subscribe(Topic::UnHide);
        drop(rx);

        bus.publish(Signal::UnHide);
        assert_eq!(bus.subscriber_count(Topic::UnHide), 0);
    }

    #[test]
    fn test_duplicate_alerts_tolerated() {
        let bus = EventBus::new();
        let rx = bus.subscribe(Topic::Alert);

        // Sighting agents re-publish every tick visibility holds
        bus.publish(Signal::Alert { target: None });
        bus.publish(Signal::Alert { target: None });

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }
}
