//! Order book display aggregation.
//!
//! The on-chain book is sparse, so the displayed table is a synthetic price
//! ladder centred on the latest hashprice with live order counts laid over
//! it. Counts are number of orders per side at a price, not cumulative size.
//!
//! Live prices are keyed at 2 decimals while ladder prices are exact tick
//! multiples. For ticks that are not a power of ten the two can disagree and
//! produce adjacent near-duplicate rows; that behaviour is kept as is.

use crate::order::{latest_index_point, HashrateIndexPoint, Order};
use crate::types::Side;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderParams {
    /// Rows generated on each side of the base price.
    pub half_depth: usize,
    /// Decimal places live order prices are rounded to before grouping.
    pub live_price_decimals: u32,
}

impl Default for LadderParams {
    fn default() -> Self {
        Self {
            half_depth: 100,
            live_price_decimals: 2,
        }
    }
}

/// One row of the displayed book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookRow {
    pub price: Decimal,
    pub bid_units: Option<u32>,
    pub ask_units: Option<u32>,
    pub is_last_hashprice: bool,
}

impl OrderBookRow {
    fn empty(price: Decimal) -> Self {
        Self {
            price,
            bid_units: None,
            ask_units: None,
            is_last_hashprice: false,
        }
    }

    pub fn units(&self) -> SideUnits {
        SideUnits {
            bids: self.bid_units.unwrap_or(0),
            asks: self.ask_units.unwrap_or(0),
        }
    }
}

/// Order counts at a single price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideUnits {
    pub bids: u32,
    pub asks: u32,
}

/// Sorted, de-duplicated rows for one data refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    rows: Vec<OrderBookRow>,
    base_price: Option<Decimal>,
}

impl OrderBookSnapshot {
    pub fn rows(&self) -> &[OrderBookRow] {
        &self.rows
    }

    pub fn base_price(&self) -> Option<Decimal> {
        self.base_price
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_at(&self, price: Decimal) -> Option<&OrderBookRow> {
        self.rows
            .binary_search_by(|r| r.price.cmp(&price))
            .ok()
            .map(|i| &self.rows[i])
    }

    pub fn last_hashprice_row(&self) -> Option<&OrderBookRow> {
        self.rows.iter().find(|r| r.is_last_hashprice)
    }

    /// Highest price with at least one bid.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.rows
            .iter()
            .rev()
            .find(|r| r.bid_units.unwrap_or(0) > 0)
            .map(|r| r.price)
    }

    /// Lowest price with at least one ask.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.rows
            .iter()
            .find(|r| r.ask_units.unwrap_or(0) > 0)
            .map(|r| r.price)
    }

    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => ask.checked_sub(bid),
            _ => None,
        }
    }

    pub fn units_by_price(&self) -> BTreeMap<Decimal, SideUnits> {
        self.rows.iter().map(|r| (r.price, r.units())).collect()
    }
}

/// Nearest multiple of `tick`, halves rounded away from zero. `None` when
/// the tick is not positive or the result leaves the `Decimal` range.
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Option<Decimal> {
    if tick <= Decimal::ZERO {
        return None;
    }
    price
        .checked_div(tick)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(tick)
}

/// `base - n*tick ..= base + n*tick`, ascending. Not clamped at zero.
/// `None` if any rung overflows.
pub fn price_ladder(base_price: Decimal, tick: Decimal, half_depth: usize) -> Option<Vec<Decimal>> {
    let n = i64::try_from(half_depth).ok()?;
    (-n..=n)
        .map(|i| {
            tick.checked_mul(Decimal::from(i))
                .and_then(|offset| base_price.checked_add(offset))
        })
        .collect()
}

/// Count live orders per side, grouped by price rounded to `decimals`.
pub fn count_live_orders(orders: &[Order], decimals: u32) -> BTreeMap<Decimal, SideUnits> {
    let mut counts: BTreeMap<Decimal, SideUnits> = BTreeMap::new();
    for order in orders.iter().filter(|o| o.is_live()) {
        let price = order
            .price_usdc()
            .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
        let entry = counts.entry(price).or_default();
        match order.side() {
            Side::Buy => entry.bids += 1,
            Side::Sell => entry.asks += 1,
        }
    }
    counts
}

/// Merge live orders with a ladder around `reference_price`.
///
/// Without a reference price or a positive tick the ladder is skipped and
/// only live rows come back, none of them marked as the last hashprice. A
/// reference whose ladder does not fit in `Decimal` is treated the same way.
pub fn aggregate_order_book(
    orders: &[Order],
    reference_price: Option<Decimal>,
    tick_size: Option<Decimal>,
    params: &LadderParams,
) -> OrderBookSnapshot {
    let ladder = match (reference_price, tick_size) {
        (Some(price), Some(tick)) => round_to_tick(price, tick)
            .and_then(|base| price_ladder(base, tick, params.half_depth).map(|rungs| (base, rungs))),
        _ => None,
    };

    let mut rows: BTreeMap<Decimal, OrderBookRow> = BTreeMap::new();

    let base_price = match ladder {
        Some((base, rungs)) => {
            for price in rungs {
                rows.insert(price, OrderBookRow::empty(price));
            }
            Some(base)
        }
        None => {
            debug!(
                has_reference = reference_price.is_some(),
                has_tick = tick_size.is_some(),
                "no usable reference price or tick, skipping ladder"
            );
            None
        }
    };

    let live = count_live_orders(orders, params.live_price_decimals);
    let live_levels = live.len();
    for (price, units) in live {
        let row = rows.entry(price).or_insert_with(|| OrderBookRow::empty(price));
        if units.bids > 0 {
            row.bid_units = Some(units.bids);
        }
        if units.asks > 0 {
            row.ask_units = Some(units.asks);
        }
    }

    if let Some(base) = base_price {
        if let Some(row) = rows.get_mut(&base) {
            row.is_last_hashprice = true;
        }
    }

    debug!(rows = rows.len(), live_levels, "order book aggregated");

    OrderBookSnapshot {
        rows: rows.into_values().collect(),
        base_price,
    }
}

/// Same as [`aggregate_order_book`] with the reference taken from the
/// newest hashrate index point.
pub fn build_order_book(
    orders: &[Order],
    index_points: &[HashrateIndexPoint],
    tick_size: Option<Decimal>,
    params: &LadderParams,
) -> OrderBookSnapshot {
    let reference = latest_index_point(index_points).map(|p| p.price_usdc());
    aggregate_order_book(orders, reference, tick_size, params)
}
