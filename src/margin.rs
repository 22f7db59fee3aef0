//! Margin calculation for hashrate futures positions.
//!
//! A position is quoted as a price per day of delivery. Its maintenance
//! margin is a percentage of the entry notional over the whole delivery
//! window, and unrealized PnL against the current market price offsets it:
//!
//! ```text
//! pnl         = (market - entry) * days * quantity
//! maintenance = entry * days * |quantity| * margin_percent / 100
//! required    = maintenance - pnl
//! ```
//!
//! Everything is integer math on token units. Division truncates toward
//! zero and a negative result means the position is in profit beyond its
//! maintenance requirement. Nothing here fails: degenerate inputs (zero
//! days, zero percent) just flow through the formula.

use crate::order::Position;
use crate::types::{ParticipantAddress, TokenAmount};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginParams {
    /// Maintenance margin as a whole percent of entry notional (0..=100).
    pub margin_percent: u32,
    /// Length of the delivery window in days.
    pub delivery_duration_days: i64,
}

impl Default for MarginParams {
    fn default() -> Self {
        Self {
            margin_percent: 20,
            delivery_duration_days: 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBreakdown {
    pub pnl: TokenAmount,
    pub maintenance_margin: TokenAmount,
    pub required_margin: TokenAmount,
}

impl MarginBreakdown {
    /// Collateral still to be posted. A profitable position needs none.
    pub fn additional_margin_needed(&self) -> TokenAmount {
        if self.required_margin.is_negative() {
            TokenAmount::ZERO
        } else {
            self.required_margin
        }
    }
}

// products saturate at i128 bounds instead of wrapping
fn mul(a: i128, b: i128) -> i128 {
    a.saturating_mul(b)
}

pub fn position_pnl(
    entry_price_per_day: TokenAmount,
    quantity: i64,
    market_price_per_day: TokenAmount,
    delivery_duration_days: i64,
) -> TokenAmount {
    let price_move = market_price_per_day
        .units()
        .saturating_sub(entry_price_per_day.units());
    TokenAmount::new(mul(
        mul(price_move, delivery_duration_days as i128),
        quantity as i128,
    ))
}

pub fn maintenance_margin(
    entry_price_per_day: TokenAmount,
    quantity: i64,
    margin_percent: u32,
    delivery_duration_days: i64,
) -> TokenAmount {
    let notional = mul(
        mul(entry_price_per_day.units(), delivery_duration_days as i128),
        (quantity as i128).abs(),
    );
    TokenAmount::new(mul(notional, margin_percent as i128) / 100)
}

pub fn margin_breakdown(
    entry_price_per_day: TokenAmount,
    quantity: i64,
    market_price_per_day: TokenAmount,
    margin_percent: u32,
    delivery_duration_days: i64,
) -> MarginBreakdown {
    let pnl = position_pnl(
        entry_price_per_day,
        quantity,
        market_price_per_day,
        delivery_duration_days,
    );
    let maintenance = maintenance_margin(
        entry_price_per_day,
        quantity,
        margin_percent,
        delivery_duration_days,
    );
    MarginBreakdown {
        pnl,
        maintenance_margin: maintenance,
        required_margin: TokenAmount::new(maintenance.units().saturating_sub(pnl.units())),
    }
}

/// Minimum margin for a position entered manually. Positive quantity is
/// long, negative is short.
pub fn required_margin(
    entry_price_per_day: TokenAmount,
    quantity: i64,
    market_price_per_day: TokenAmount,
    margin_percent: u32,
    delivery_duration_days: i64,
) -> TokenAmount {
    margin_breakdown(
        entry_price_per_day,
        quantity,
        market_price_per_day,
        margin_percent,
        delivery_duration_days,
    )
    .required_margin
}

/// Margin for one side of a matched position. Each position is a single
/// contract: the buyer is long one unit at the buy price, the seller short
/// one unit at the sell price. `None` when the participant is not a party.
pub fn position_margin(
    position: &Position,
    participant: &ParticipantAddress,
    market_price_per_day: TokenAmount,
    params: &MarginParams,
) -> Option<MarginBreakdown> {
    let side = position.side_of(participant)?;
    Some(margin_breakdown(
        position.entry_price_for(side),
        side.sign(),
        market_price_per_day,
        params.margin_percent,
        params.delivery_duration_days,
    ))
}

/// Sum of required margin over the participant's open positions. Profitable
/// positions offset losing ones, same as on the contract side.
pub fn total_required_margin(
    participant: &ParticipantAddress,
    positions: &[Position],
    market_price_per_day: TokenAmount,
    params: &MarginParams,
) -> TokenAmount {
    let total = positions
        .iter()
        .filter(|p| p.is_open())
        .filter_map(|p| position_margin(p, participant, market_price_per_day, params))
        .fold(0i128, |acc, m| acc.saturating_add(m.required_margin.units()));
    TokenAmount::new(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PositionId;

    fn usdc(units: i128) -> TokenAmount {
        TokenAmount::new(units)
    }

    fn position(buyer: &str, seller: &str, buy: i128, sell: i128) -> Position {
        Position {
            id: PositionId(format!("{buyer}-{seller}")),
            buyer: ParticipantAddress::new(buyer),
            seller: ParticipantAddress::new(seller),
            buy_price_per_day: usdc(buy),
            sell_price_per_day: usdc(sell),
            delivery_at: 1_700_000_000,
            start_time: 1_699_000_000,
            closed_at: None,
            buyer_pnl: None,
            seller_pnl: None,
        }
    }

    #[test]
    fn long_in_profit() {
        // 2 contracts, entry $5, market $5.50, 7 days, 20%
        let m = margin_breakdown(usdc(5_000000), 2, usdc(5_500000), 20, 7);
        // 0.5 * 7 * 2 = $7 pnl
        assert_eq!(m.pnl, usdc(7_000000));
        // 5 * 7 * 2 * 20% = $14 maintenance
        assert_eq!(m.maintenance_margin, usdc(14_000000));
        assert_eq!(m.required_margin, usdc(7_000000));
    }

    #[test]
    fn short_losing_needs_more() {
        let m = margin_breakdown(usdc(5_000000), -1, usdc(5_500000), 20, 7);
        assert_eq!(m.pnl, usdc(-3_500000));
        assert_eq!(m.maintenance_margin, usdc(7_000000));
        assert_eq!(m.required_margin, usdc(10_500000));
    }

    #[test]
    fn deep_profit_goes_negative() {
        let req = required_margin(usdc(5_000000), 1, usdc(10_000000), 10, 7);
        // pnl 35, maintenance 3.5
        assert_eq!(req, usdc(-31_500000));
        let m = margin_breakdown(usdc(5_000000), 1, usdc(10_000000), 10, 7);
        assert_eq!(m.additional_margin_needed(), TokenAmount::ZERO);
    }

    #[test]
    fn division_truncates_toward_zero() {
        // 1 * 1 * 1 * 33 / 100 = 0.33 -> 0
        assert_eq!(maintenance_margin(usdc(1), 1, 33, 1), usdc(0));
        // 7 * 1 * 1 * 15 / 100 = 1.05 -> 1
        assert_eq!(maintenance_margin(usdc(7), -1, 15, 1), usdc(1));
    }

    #[test]
    fn zero_duration_flows_through() {
        let m = margin_breakdown(usdc(5_000000), 3, usdc(9_000000), 20, 0);
        assert_eq!(m.pnl, usdc(0));
        assert_eq!(m.maintenance_margin, usdc(0));
        assert_eq!(m.required_margin, usdc(0));
    }

    #[test]
    fn extreme_inputs_saturate() {
        let m = margin_breakdown(usdc(i64::MAX as i128), i64::MAX, usdc(0), 100, i64::MAX);
        assert!(m.maintenance_margin.units() > 0);
    }

    #[test]
    fn position_margin_by_side() {
        let params = MarginParams::default();
        let pos = position("0xbuyer", "0xseller", 5_000000, 5_000000);

        let buyer = position_margin(&pos, &ParticipantAddress::new("0xBUYER"), usdc(5_500000), &params).unwrap();
        assert_eq!(buyer.pnl, usdc(3_500000));
        assert_eq!(buyer.required_margin, usdc(3_500000));

        let seller = position_margin(&pos, &ParticipantAddress::new("0xseller"), usdc(5_500000), &params).unwrap();
        assert_eq!(seller.pnl, usdc(-3_500000));
        assert_eq!(seller.required_margin, usdc(10_500000));

        assert!(position_margin(&pos, &ParticipantAddress::new("0xnobody"), usdc(5_500000), &params).is_none());
    }

    #[test]
    fn total_skips_closed_and_foreign_positions() {
        let params = MarginParams::default();
        let me = ParticipantAddress::new("0xme");
        let mut closed = position("0xme", "0xb", 5_000000, 5_000000);
        closed.closed_at = Some(1_700_000_500);
        let positions = vec![
            position("0xme", "0xa", 5_000000, 5_000000),
            position("0xa", "0xme", 5_000000, 5_000000),
            closed,
            position("0xa", "0xb", 5_000000, 5_000000),
        ];

        // at entry price pnl is zero, each open leg needs $7
        let total = total_required_margin(&me, &positions, usdc(5_000000), &params);
        assert_eq!(total, usdc(14_000000));
    }
}
