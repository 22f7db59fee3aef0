//! Book refresh: rebuild the snapshot, diff it, publish events.

use super::core::OrderBookView;
use super::data::ORDER_BOOK_QUERY;
use super::results::{RefreshResult, ViewError};
use crate::cache::QueryKey;
use crate::events::{EventPayload, HighlightsRaisedEvent, SnapshotRebuiltEvent};
use crate::highlighter::HighlightTransition;
use crate::order::{HashrateIndexPoint, Order};
use crate::order_book::build_order_book;

impl OrderBookView {
    /// Recompute from whatever the cache currently holds.
    pub fn refresh(&mut self) -> Result<RefreshResult, ViewError> {
        self.ensure_live()?;
        let orders = self.load_orders()?;
        let points = self.load_index_points()?;
        self.rebuild(&orders, &points)
    }

    /// Recompute from data handed in directly.
    pub fn refresh_with(
        &mut self,
        orders: &[Order],
        index_points: &[HashrateIndexPoint],
    ) -> Result<RefreshResult, ViewError> {
        self.ensure_live()?;
        self.rebuild(orders, index_points)
    }

    fn rebuild(
        &mut self,
        orders: &[Order],
        index_points: &[HashrateIndexPoint],
    ) -> Result<RefreshResult, ViewError> {
        let book = &self.config.app.book;
        let snapshot = build_order_book(orders, index_points, book.tick_size, &book.ladder);

        self.lock_cache().insert(QueryKey::new(ORDER_BOOK_QUERY), &snapshot)?;

        self.emit_event(EventPayload::SnapshotRebuilt(SnapshotRebuiltEvent {
            rows: snapshot.len(),
            base_price: snapshot.base_price(),
            best_bid: snapshot.best_bid(),
            best_ask: snapshot.best_ask(),
        }));

        let mut result = RefreshResult {
            rows: snapshot.len(),
            base_price: snapshot.base_price(),
            highlighted: 0,
            scroll_to: None,
        };

        for transition in self.highlighter.observe(&snapshot, self.current_time) {
            match transition {
                HighlightTransition::Cleared => {
                    self.emit_event(EventPayload::HighlightsCleared);
                }
                HighlightTransition::Raised {
                    flags,
                    scroll_to,
                    expires_at,
                    replaced,
                } => {
                    result.highlighted = flags.len();
                    result.scroll_to = Some(scroll_to);
                    self.emit_event(EventPayload::HighlightsRaised(HighlightsRaisedEvent {
                        rows: flags.len(),
                        scroll_to,
                        expires_at,
                        replaced,
                    }));
                }
            }
        }

        self.snapshot = snapshot;
        Ok(result)
    }
}
