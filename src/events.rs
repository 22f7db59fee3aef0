// 6.0: every view-visible state change produces an event. consumers that used to re-render
// on hook changes subscribe here instead. EventPayload lists everything that can happen.

use crate::types::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    // Book events
    SnapshotRebuilt(SnapshotRebuiltEvent),

    // Highlight events
    HighlightsRaised(HighlightsRaisedEvent),
    HighlightsCleared,

    // Cache events
    CacheInvalidated(CacheInvalidatedEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRebuiltEvent {
    pub rows: usize,
    pub base_price: Option<Decimal>,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightsRaisedEvent {
    pub rows: usize,
    pub scroll_to: Decimal,
    pub expires_at: Timestamp,
    pub replaced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheInvalidatedEvent {
    pub query: String,
    pub entries: usize,
}

pub trait EventEmitter {
    fn emit(&mut self, event: Event);
}

/// Audit buffer keeping the most recent `limit` events.
#[derive(Debug)]
pub struct EventCollector {
    events: Vec<Event>,
    limit: usize,
}

impl EventCollector {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::new(),
            limit,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventEmitter for EventCollector {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
        if self.events.len() > self.limit {
            let drain_count = self.events.len() - self.limit;
            self.events.drain(0..drain_count);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

type Listener = Box<dyn FnMut(&Event)>;

/// Fan-out to registered listeners. Single-threaded, so listeners are plain
/// `FnMut` closures and run synchronously inside `emit`.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventEmitter for EventBus {
    fn emit(&mut self, event: Event) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }
}
