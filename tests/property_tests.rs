//! Property-based tests for the margin and order book math.
//!
//! These tests verify invariants hold under random inputs.

use hashbook_core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Strategies for generating test data
fn price_units_strategy() -> impl Strategy<Value = i128> {
    1i128..100_000_000i128 // $0.000001 to $100
}

fn quantity_strategy() -> impl Strategy<Value = i64> {
    -1_000i64..=1_000i64
}

fn tick_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(dec!(0.01)), Just(dec!(0.05)), Just(dec!(0.10)), Just(dec!(0.25))]
}

fn orders_strategy() -> impl Strategy<Value = Vec<Order>> {
    proptest::collection::vec((1i128..20_000000i128, any::<bool>(), any::<bool>()), 0..60).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (price, is_buy, is_active))| Order {
                    id: OrderId(format!("0x{i:x}")),
                    price: TokenAmount::new(price),
                    delivery_date: 1_700_000_000,
                    is_buy,
                    is_active,
                    participant_address: ParticipantAddress::new("0xabc"),
                })
                .collect()
        },
    )
}

proptest! {
    /// required = maintenance - pnl, exactly
    #[test]
    fn required_is_maintenance_minus_pnl(
        entry in price_units_strategy(),
        market in price_units_strategy(),
        qty in quantity_strategy(),
        pct in 0u32..=100u32,
        days in 1i64..=365i64,
    ) {
        let m = margin_breakdown(TokenAmount::new(entry), qty, TokenAmount::new(market), pct, days);
        prop_assert_eq!(m.required_margin.units(), m.maintenance_margin.units() - m.pnl.units());
        prop_assert_eq!(
            m.maintenance_margin.units(),
            entry * days as i128 * (qty as i128).abs() * pct as i128 / 100
        );
        prop_assert_eq!(m.pnl.units(), (market - entry) * days as i128 * qty as i128);
    }

    /// long and short of the same size have opposite pnl and equal maintenance
    #[test]
    fn long_short_symmetry(
        entry in price_units_strategy(),
        market in price_units_strategy(),
        qty in 1i64..1_000i64,
        pct in 0u32..=100u32,
        days in 1i64..=30i64,
    ) {
        let long = margin_breakdown(TokenAmount::new(entry), qty, TokenAmount::new(market), pct, days);
        let short = margin_breakdown(TokenAmount::new(entry), -qty, TokenAmount::new(market), pct, days);
        prop_assert_eq!(long.pnl.units(), -short.pnl.units());
        prop_assert_eq!(long.maintenance_margin, short.maintenance_margin);
    }

    /// additional margin is never negative
    #[test]
    fn additional_margin_non_negative(
        entry in price_units_strategy(),
        market in price_units_strategy(),
        qty in quantity_strategy(),
    ) {
        let m = margin_breakdown(TokenAmount::new(entry), qty, TokenAmount::new(market), 20, 7);
        prop_assert!(m.additional_margin_needed().units() >= 0);
    }

    /// same input, same rows
    #[test]
    fn aggregation_is_idempotent(
        orders in orders_strategy(),
        reference in 1i64..2_000i64,
        tick in tick_strategy(),
    ) {
        let reference = Some(Decimal::new(reference, 2));
        let params = LadderParams::default();
        let a = aggregate_order_book(&orders, reference, Some(tick), &params);
        let b = aggregate_order_book(&orders, reference, Some(tick), &params);
        prop_assert_eq!(a, b);
    }

    /// exactly one last-hashprice row with a reference and tick, none without
    #[test]
    fn single_last_hashprice_row(
        orders in orders_strategy(),
        reference in 1i64..2_000i64,
        tick in tick_strategy(),
    ) {
        let params = LadderParams::default();
        let reference = Decimal::new(reference, 2);

        let with_ladder = aggregate_order_book(&orders, Some(reference), Some(tick), &params);
        prop_assert_eq!(with_ladder.rows().iter().filter(|r| r.is_last_hashprice).count(), 1);

        let no_ref = aggregate_order_book(&orders, None, Some(tick), &params);
        prop_assert_eq!(no_ref.rows().iter().filter(|r| r.is_last_hashprice).count(), 0);

        let no_tick = aggregate_order_book(&orders, Some(reference), None, &params);
        prop_assert_eq!(no_tick.rows().iter().filter(|r| r.is_last_hashprice).count(), 0);
    }

    /// rows strictly ascending, so prices are unique
    #[test]
    fn rows_sorted_and_unique(
        orders in orders_strategy(),
        reference in 1i64..2_000i64,
        tick in tick_strategy(),
    ) {
        let book = aggregate_order_book(&orders, Some(Decimal::new(reference, 2)), Some(tick), &LadderParams::default());
        for pair in book.rows().windows(2) {
            prop_assert!(pair[0].price < pair[1].price);
        }
    }

    /// every live order is counted exactly once
    #[test]
    fn live_counts_preserved(orders in orders_strategy()) {
        let book = aggregate_order_book(&orders, Some(dec!(5)), Some(dec!(0.05)), &LadderParams::default());
        let counted: u32 = book
            .rows()
            .iter()
            .map(|r| r.bid_units.unwrap_or(0) + r.ask_units.unwrap_or(0))
            .sum();
        let live = orders.iter().filter(|o| o.is_active).count() as u32;
        prop_assert_eq!(counted, live);
    }

    /// replaying an identical snapshot never raises a highlight
    #[test]
    fn identical_snapshot_not_flagged(orders in orders_strategy()) {
        let book = aggregate_order_book(&orders, None, None, &LadderParams::default());
        let mut h = ChangeHighlighter::new(HighlightParams::default());
        h.observe(&book, Timestamp::from_millis(0));
        let transitions = h.observe(&book, Timestamp::from_millis(10));
        prop_assert!(transitions.is_empty());
    }
}
