//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{ContractEvent, ProofEvent, RollupEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Dispatches and committed checkpoints
    Rollup,
    /// Contract state changes and mints
    Contract,
    /// Proof pipeline events
    Proof,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Rollup(RollupEvent),
    Contract(ContractEvent),
    Proof(ProofEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Rollup(_) => Topic::Rollup,
            Event::Contract(_) => Topic::Contract,
            Event::Proof(_) => Topic::Proof,
        }
    }
}

struct Channels {
    rollup: broadcast::Sender<Event>,
    contract: broadcast::Sender<Event>,
    proof: broadcast::Sender<Event>,
}

impl Channels {
    fn get(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Rollup => &self.rollup,
            Topic::Contract => &self.contract,
            Topic::Proof => &self.proof,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing is fire-and-forget: events without
/// subscribers are dropped, and slow subscribers observe `Lagged`.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                rollup: broadcast::channel(capacity).0,
                contract: broadcast::channel(capacity).0,
                proof: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.channels.get(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.get(topic).subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zk::Stage;

    #[tokio::test]
    async fn test_events_route_by_topic() {
        let bus = EventBus::with_capacity(4);
        let mut proofs = bus.subscribe(Topic::Proof);
        let mut contracts = bus.subscribe(Topic::Contract);

        let event = Event::Proof(ProofEvent::StageStarted {
            stage: Stage::Ownership,
        });
        bus.publish(event.clone());

        assert_eq!(proofs.recv().await.unwrap(), event);
        assert!(contracts.try_recv().is_err());
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(Event::Proof(ProofEvent::StageStarted {
            stage: Stage::Merge,
        }));
    }
}
