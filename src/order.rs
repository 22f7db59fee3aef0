//! Indexer records: orders, positions and hashrate index points.
//!
//! These mirror the GraphQL response shapes (camelCase, big integers as
//! strings). Records are immutable once created on chain; a "modified" order
//! is a close followed by a new order with a new id.

use crate::types::{OrderId, ParticipantAddress, PositionId, Side, TokenAmount};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A resting futures order as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Price per day in token units (6 decimals).
    pub price: TokenAmount,
    /// Delivery start, unix seconds.
    pub delivery_date: i64,
    pub is_buy: bool,
    pub is_active: bool,
    pub participant_address: ParticipantAddress,
}

impl Order {
    pub fn side(&self) -> Side {
        Side::from_is_buy(self.is_buy)
    }

    pub fn price_usdc(&self) -> Decimal {
        self.price.to_usdc()
    }

    /// Only active orders count toward book depth.
    pub fn is_live(&self) -> bool {
        self.is_active
    }

    pub fn belongs_to(&self, participant: &ParticipantAddress) -> bool {
        self.participant_address.matches(participant)
    }
}

/// A matched buy/sell pair. The buyer is long, the seller is short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub buyer: ParticipantAddress,
    pub seller: ParticipantAddress,
    pub buy_price_per_day: TokenAmount,
    pub sell_price_per_day: TokenAmount,
    /// Delivery start, unix seconds.
    pub delivery_at: i64,
    pub start_time: i64,
    #[serde(default)]
    pub closed_at: Option<i64>,
    #[serde(default)]
    pub buyer_pnl: Option<TokenAmount>,
    #[serde(default)]
    pub seller_pnl: Option<TokenAmount>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }

    /// Which side of this position the participant holds, if any.
    pub fn side_of(&self, participant: &ParticipantAddress) -> Option<Side> {
        if self.buyer.matches(participant) {
            Some(Side::Buy)
        } else if self.seller.matches(participant) {
            Some(Side::Sell)
        } else {
            None
        }
    }

    pub fn entry_price_for(&self, side: Side) -> TokenAmount {
        match side {
            Side::Buy => self.buy_price_per_day,
            Side::Sell => self.sell_price_per_day,
        }
    }
}

/// One published hashprice from the hashrate index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashrateIndexPoint {
    /// Unix seconds.
    pub updated_at: i64,
    pub price_token: TokenAmount,
}

impl HashrateIndexPoint {
    pub fn price_usdc(&self) -> Decimal {
        self.price_token.to_usdc()
    }
}

/// Newest point by `updatedAt`. Ties keep the first seen.
pub fn latest_index_point(points: &[HashrateIndexPoint]) -> Option<&HashrateIndexPoint> {
    points.iter().fold(None, |best: Option<&HashrateIndexPoint>, p| match best {
        Some(b) if b.updated_at >= p.updated_at => Some(b),
        _ => Some(p),
    })
}
