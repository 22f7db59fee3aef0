//! Transient highlighting of order book rows that gained orders.
//!
//! Each snapshot is diffed against the previous one. A row is flagged green
//! when its bid count grew (or it appeared with bids) and red when its ask
//! count grew. Flags live for a fixed delay and then clear on their own.
//!
//! State machine: `Idle -> Highlighted -> Idle`. A new detection while
//! highlighted replaces the whole flag set and restarts the timer; a
//! snapshot with no increases leaves a running highlight alone. Time is
//! always passed in by the caller so the timer can be driven in tests.

use crate::order_book::{OrderBookSnapshot, SideUnits};
use crate::types::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightParams {
    pub clear_after_ms: i64,
}

impl Default for HighlightParams {
    fn default() -> Self {
        Self {
            clear_after_ms: 3_000,
        }
    }
}

/// Which sides of a row grew since the last snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowHighlight {
    pub bid: bool,
    pub ask: bool,
}

impl RowHighlight {
    pub fn is_green(&self) -> bool {
        self.bid
    }

    pub fn is_red(&self) -> bool {
        self.ask
    }

    fn any(&self) -> bool {
        self.bid || self.ask
    }
}

pub type HighlightFlags = BTreeMap<Decimal, RowHighlight>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightState {
    Idle,
    Highlighted { expires_at: Timestamp },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightTransition {
    Raised {
        flags: HighlightFlags,
        /// Lowest flagged price. The view centres on this row.
        scroll_to: Decimal,
        expires_at: Timestamp,
        /// True when an active highlight was replaced before expiring.
        replaced: bool,
    },
    Cleared,
}

/// Rows whose bid or ask count increased relative to `previous`.
/// Missing counts are treated as zero.
pub fn detect_increases(
    previous: &BTreeMap<Decimal, SideUnits>,
    next: &OrderBookSnapshot,
) -> HighlightFlags {
    let mut flags = HighlightFlags::new();
    for row in next.rows() {
        let now = row.units();
        let before = previous.get(&row.price).copied().unwrap_or_default();
        let flag = RowHighlight {
            bid: now.bids > before.bids,
            ask: now.asks > before.asks,
        };
        if flag.any() {
            flags.insert(row.price, flag);
        }
    }
    flags
}

#[derive(Debug, Clone, Default)]
pub struct ChangeHighlighter {
    params: HighlightParams,
    previous: BTreeMap<Decimal, SideUnits>,
    flags: HighlightFlags,
    expires_at: Option<Timestamp>,
}

impl ChangeHighlighter {
    pub fn new(params: HighlightParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn params(&self) -> &HighlightParams {
        &self.params
    }

    pub fn state(&self) -> HighlightState {
        match self.expires_at {
            Some(expires_at) => HighlightState::Highlighted { expires_at },
            None => HighlightState::Idle,
        }
    }

    /// Flags as of the last `observe`/`expire` call.
    pub fn flags(&self) -> &HighlightFlags {
        &self.flags
    }

    /// Flag for one row, honouring the timer even if `expire` was not called.
    pub fn flag_at(&self, price: Decimal, now: Timestamp) -> Option<RowHighlight> {
        match self.expires_at {
            Some(expires_at) if now < expires_at => self.flags.get(&price).copied(),
            _ => None,
        }
    }

    pub fn scroll_target(&self) -> Option<Decimal> {
        self.flags.keys().next().copied()
    }

    /// Diff `snapshot` against the previous one and update the highlight.
    /// Returns the transitions in the order they happened: an expiry of the
    /// old highlight can precede a new one.
    pub fn observe(&mut self, snapshot: &OrderBookSnapshot, now: Timestamp) -> Vec<HighlightTransition> {
        let mut transitions = Vec::new();
        if let Some(cleared) = self.expire(now) {
            transitions.push(cleared);
        }

        let increases = detect_increases(&self.previous, snapshot);
        self.previous = snapshot.units_by_price();

        let lowest = increases.keys().next().copied();
        if let Some(scroll_to) = lowest {
            let replaced = self.expires_at.is_some();
            let expires_at = now.plus_millis(self.params.clear_after_ms);
            info!(
                rows = increases.len(),
                scroll_to = %scroll_to,
                replaced,
                "order book rows highlighted"
            );
            self.flags = increases.clone();
            self.expires_at = Some(expires_at);
            transitions.push(HighlightTransition::Raised {
                flags: increases,
                scroll_to,
                expires_at,
                replaced,
            });
        } else {
            debug!(rows = snapshot.len(), "no order book increases");
        }

        transitions
    }

    /// Clear the highlight if its timer has run out.
    pub fn expire(&mut self, now: Timestamp) -> Option<HighlightTransition> {
        match self.expires_at {
            Some(expires_at) if now >= expires_at => {
                debug!(cleared = self.flags.len(), "order book highlight expired");
                self.flags.clear();
                self.expires_at = None;
                Some(HighlightTransition::Cleared)
            }
            _ => None,
        }
    }

    /// Teardown: drop the running timer and the remembered snapshot.
    pub fn reset(&mut self) {
        self.flags.clear();
        self.expires_at = None;
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use crate::order_book::{aggregate_order_book, LadderParams};
    use crate::types::{OrderId, ParticipantAddress, TokenAmount};
    use rust_decimal_macros::dec;

    // bids then asks per (price in cents, bid count, ask count)
    fn book(levels: &[(i128, u32, u32)]) -> OrderBookSnapshot {
        let mut orders = Vec::new();
        for &(cents, bids, asks) in levels {
            for i in 0..bids + asks {
                orders.push(Order {
                    id: OrderId(format!("{cents}-{i}")),
                    price: TokenAmount::new(cents * 10_000),
                    delivery_date: 1_700_000_000,
                    is_buy: i < bids,
                    is_active: true,
                    participant_address: ParticipantAddress::new("0xabc"),
                });
            }
        }
        aggregate_order_book(&orders, None, None, &LadderParams::default())
    }

    fn ms(v: i64) -> Timestamp {
        Timestamp::from_millis(v)
    }

    #[test]
    fn new_price_with_bids_is_green() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        let t = h.observe(&book(&[(500, 3, 0)]), ms(0));
        assert_eq!(t.len(), 1);
        let flag = h.flag_at(dec!(5.00), ms(0)).unwrap();
        assert!(flag.is_green());
        assert!(!flag.is_red());
    }

    #[test]
    fn ask_decrease_not_flagged() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(500, 0, 5)]), ms(0));
        let t = h.observe(&book(&[(500, 0, 2)]), ms(10_000));
        assert!(t.contains(&HighlightTransition::Cleared));
        assert!(!t.iter().any(|t| matches!(t, HighlightTransition::Raised { .. })));
        assert!(h.flag_at(dec!(5.00), ms(10_000)).is_none());
    }

    #[test]
    fn bid_increase_is_green() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(500, 1, 0)]), ms(0));
        h.observe(&book(&[(500, 4, 0)]), ms(100));
        assert!(h.flag_at(dec!(5.00), ms(100)).unwrap().is_green());
    }

    #[test]
    fn ask_increase_is_red() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(510, 0, 1)]), ms(0));
        h.observe(&book(&[(510, 0, 2)]), ms(100));
        let flag = h.flag_at(dec!(5.10), ms(100)).unwrap();
        assert!(flag.is_red());
        assert!(!flag.is_green());
    }

    #[test]
    fn flags_clear_after_delay() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(500, 1, 0)]), ms(1_000));
        assert!(matches!(h.state(), HighlightState::Highlighted { .. }));

        assert_eq!(h.expire(ms(3_999)), None);
        assert!(!h.flags().is_empty());

        assert_eq!(h.expire(ms(4_000)), Some(HighlightTransition::Cleared));
        assert!(h.flags().is_empty());
        assert_eq!(h.state(), HighlightState::Idle);
    }

    #[test]
    fn flag_at_respects_timer_without_expire() {
        let mut h = ChangeHighlighter::new(HighlightParams { clear_after_ms: 500 });
        h.observe(&book(&[(500, 1, 0)]), ms(0));
        assert!(h.flag_at(dec!(5.00), ms(499)).is_some());
        assert!(h.flag_at(dec!(5.00), ms(500)).is_none());
    }

    #[test]
    fn new_detection_replaces_and_restarts() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(500, 1, 0)]), ms(0));
        let t = h.observe(&book(&[(500, 1, 0), (600, 0, 1)]), ms(2_000));

        match &t[..] {
            [HighlightTransition::Raised { flags, scroll_to, expires_at, replaced }] => {
                assert_eq!(flags.len(), 1);
                assert_eq!(*scroll_to, dec!(6.00));
                assert_eq!(*expires_at, ms(5_000));
                assert!(*replaced);
            }
            other => panic!("unexpected transitions {other:?}"),
        }
        // old row no longer flagged
        assert!(h.flag_at(dec!(5.00), ms(2_000)).is_none());
        assert!(h.flag_at(dec!(6.00), ms(4_000)).is_some());
    }

    #[test]
    fn quiet_snapshot_keeps_running_timer() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(500, 1, 0)]), ms(0));
        let t = h.observe(&book(&[(500, 1, 0)]), ms(1_000));
        assert!(t.is_empty());
        assert_eq!(h.state(), HighlightState::Highlighted { expires_at: ms(3_000) });
    }

    #[test]
    fn scroll_target_is_lowest_flagged_price() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(700, 1, 0), (450, 0, 1), (520, 2, 0)]), ms(0));
        assert_eq!(h.scroll_target(), Some(dec!(4.50)));
    }

    #[test]
    fn reset_forgets_history() {
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book(&[(500, 1, 0)]), ms(0));
        h.reset();
        assert_eq!(h.state(), HighlightState::Idle);
        // same book again counts as new after teardown
        let t = h.observe(&book(&[(500, 1, 0)]), ms(10));
        assert_eq!(t.len(), 1);
    }
}
