// 8.0 view/core.rs: the view struct. owns config, cache, highlighter, listeners and the clock.

use super::config::ViewConfig;
use super::results::ViewError;
use crate::cache::{QueryCache, SharedCache};
use crate::events::{Event, EventBus, EventCollector, EventEmitter, EventId, EventPayload, SubscriptionId};
use crate::highlighter::{ChangeHighlighter, RowHighlight};
use crate::order_book::OrderBookSnapshot;
use crate::types::Timestamp;
use rust_decimal::Decimal;
use std::sync::{MutexGuard, PoisonError};
use tracing::info;

/** 8.1: main view struct. all state lives here */
#[derive(Debug)]
pub struct OrderBookView {
    pub(super) config: ViewConfig,
    pub(super) cache: SharedCache,
    pub(super) highlighter: ChangeHighlighter,
    pub(super) snapshot: OrderBookSnapshot,
    pub(super) bus: EventBus,
    pub(super) events: EventCollector,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
    pub(super) torn_down: bool,
}

impl OrderBookView {
    /// View with a cache of its own.
    pub fn new(config: ViewConfig) -> Result<Self, ViewError> {
        Self::with_cache(config, QueryCache::shared())
    }

    /// View reading and invalidating `cache`, which other views may share,
    /// e.g. [`QueryCache::global`].
    pub fn with_cache(config: ViewConfig, cache: SharedCache) -> Result<Self, ViewError> {
        config.app.validate()?;
        let highlighter = ChangeHighlighter::new(config.app.highlight);
        let events = EventCollector::with_limit(config.max_events);
        Ok(Self {
            config,
            cache,
            highlighter,
            snapshot: OrderBookSnapshot::default(),
            bus: EventBus::new(),
            events,
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
            torn_down: false,
        })
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    /// Move the clock. A highlight whose delay has run out is cleared here.
    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
        if self.highlighter.expire(timestamp).is_some() {
            self.emit_event(EventPayload::HighlightsCleared);
        }
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.set_time(self.current_time.plus_millis(millis));
    }

    pub fn snapshot(&self) -> &OrderBookSnapshot {
        &self.snapshot
    }

    pub fn highlight_at(&self, price: Decimal) -> Option<RowHighlight> {
        self.highlighter.flag_at(price, self.current_time)
    }

    pub fn highlighter(&self) -> &ChangeHighlighter {
        &self.highlighter
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Event) + 'static) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        self.events.recent(count)
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Stop the view: clear any running highlight timer and the remembered
    /// snapshot. Later refreshes fail with `TornDown`.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let had_highlight = !self.highlighter.flags().is_empty();
        self.highlighter.reset();
        if had_highlight {
            self.emit_event(EventPayload::HighlightsCleared);
        }
        self.torn_down = true;
        info!(events = self.events.len(), "order book view torn down");
    }

    pub(super) fn ensure_live(&self) -> Result<(), ViewError> {
        if self.torn_down {
            Err(ViewError::TornDown)
        } else {
            Ok(())
        }
    }

    // a poisoned lock still holds whole JSON entries
    pub(super) fn lock_cache(&self) -> MutexGuard<'_, QueryCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        self.bus.emit(event.clone());
        self.events.emit(event);
    }
}
