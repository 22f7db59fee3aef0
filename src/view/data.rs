//! Cached indexer data backing the view.
//!
//! The data layer pushes decoded query responses in through `store_*`; reads
//! decode them back out. An uncached query reads as empty.

use super::core::OrderBookView;
use super::results::ViewError;
use crate::cache::QueryKey;
use crate::events::{CacheInvalidatedEvent, EventPayload};
use crate::margin::total_required_margin;
use crate::order::{latest_index_point, HashrateIndexPoint, Order, Position};
use crate::types::{ParticipantAddress, TokenAmount};

pub const ORDERS_QUERY: &str = "orders";
pub const INDEX_QUERY: &str = "hashrateIndex";
pub const POSITIONS_QUERY: &str = "positions";
pub const ORDER_BOOK_QUERY: &str = "orderBook";

fn positions_key(participant: &ParticipantAddress) -> QueryKey {
    QueryKey::new(POSITIONS_QUERY).param("participant", participant.as_str().to_ascii_lowercase())
}

impl OrderBookView {
    pub fn store_orders(&mut self, orders: &[Order]) -> Result<(), ViewError> {
        self.ensure_live()?;
        self.lock_cache().insert(QueryKey::new(ORDERS_QUERY), &orders)?;
        Ok(())
    }

    pub fn store_index_points(&mut self, points: &[HashrateIndexPoint]) -> Result<(), ViewError> {
        self.ensure_live()?;
        self.lock_cache().insert(QueryKey::new(INDEX_QUERY), &points)?;
        Ok(())
    }

    pub fn store_positions(
        &mut self,
        participant: &ParticipantAddress,
        positions: &[Position],
    ) -> Result<(), ViewError> {
        self.ensure_live()?;
        self.lock_cache().insert(positions_key(participant), &positions)?;
        Ok(())
    }

    pub fn load_orders(&self) -> Result<Vec<Order>, ViewError> {
        Ok(self.lock_cache().get(&QueryKey::new(ORDERS_QUERY))?.unwrap_or_default())
    }

    pub fn load_index_points(&self) -> Result<Vec<HashrateIndexPoint>, ViewError> {
        Ok(self.lock_cache().get(&QueryKey::new(INDEX_QUERY))?.unwrap_or_default())
    }

    pub fn load_positions(&self, participant: &ParticipantAddress) -> Result<Vec<Position>, ViewError> {
        Ok(self.lock_cache().get(&positions_key(participant))?.unwrap_or_default())
    }

    /// Newest hashprice, used as the market price per day.
    pub fn market_price_per_day(&self) -> Result<Option<TokenAmount>, ViewError> {
        let points = self.load_index_points()?;
        Ok(latest_index_point(&points).map(|p| p.price_token))
    }

    /// Drop every cached parameterisation of `query`, e.g. after an order is
    /// placed or a deposit lands. Views sharing the cache see it too.
    pub fn invalidate(&mut self, query: &str) -> Result<usize, ViewError> {
        self.ensure_live()?;
        let entries = self.lock_cache().invalidate_query(query);
        self.emit_event(EventPayload::CacheInvalidated(CacheInvalidatedEvent {
            query: query.to_string(),
            entries,
        }));
        Ok(entries)
    }

    /// Margin the participant must hold across cached open positions, at the
    /// latest hashprice. `None` until an index point is cached.
    pub fn required_margin(
        &self,
        participant: &ParticipantAddress,
    ) -> Result<Option<TokenAmount>, ViewError> {
        let Some(market_price) = self.market_price_per_day()? else {
            return Ok(None);
        };
        let positions = self.load_positions(participant)?;
        Ok(Some(total_required_margin(
            participant,
            &positions,
            market_price,
            &self.config.app.margin,
        )))
    }
}
