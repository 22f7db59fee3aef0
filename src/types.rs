// 1.0: primitives shared by every module. ids, addresses, fixed-point token amounts, timestamps.
// amounts cross the chain/indexer boundary as integers in the token's smallest unit.
// they only become Decimal at the display edge.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// USDC and the hashrate index both use 6 decimals on chain.
pub const USDC_DECIMALS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(pub String);

// 1.1: wallet address. hex addresses are case-insensitive, so compare with `matches`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantAddress(pub String);

impl ParticipantAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, other: &ParticipantAddress) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl fmt::Display for ParticipantAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Buy = long hashrate delivery. Sell = short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn from_is_buy(is_buy: bool) -> Self {
        if is_buy {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// Signed contract quantity for one unit on this side.
    pub fn sign(&self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("invalid integer amount {0:?}")]
    InvalidInteger(String),

    #[error("amount {0} has more than {1} decimal places")]
    TooPrecise(Decimal, u32),

    #[error("amount {0} does not fit in 128 bits")]
    OutOfRange(Decimal),
}

// 1.2: fixed-point token amount in the smallest unit (6 decimals for USDC).
// the indexer encodes big integers as strings, sometimes as plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAmount", into = "String")]
pub struct TokenAmount(i128);

impl TokenAmount {
    pub const ZERO: TokenAmount = TokenAmount(0);

    pub fn new(units: i128) -> Self {
        Self(units)
    }

    pub fn units(&self) -> i128 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Decimal view for display, e.g. 5_250000 -> 5.25 with 6 decimals.
    pub fn to_decimal(&self, decimals: u32) -> Decimal {
        Decimal::try_from_i128_with_scale(self.0, decimals).unwrap_or(if self.0 < 0 {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
    }

    pub fn to_usdc(&self) -> Decimal {
        self.to_decimal(USDC_DECIMALS)
    }

    /// Exact conversion back to integer units. Rejects sub-unit precision.
    pub fn from_decimal(value: Decimal, decimals: u32) -> Result<Self, AmountError> {
        let scaled = value
            .checked_mul(Decimal::from(10u64.pow(decimals)))
            .ok_or(AmountError::OutOfRange(value))?;
        if !scaled.fract().is_zero() {
            return Err(AmountError::TooPrecise(value, decimals));
        }
        scaled
            .to_i128()
            .map(Self)
            .ok_or(AmountError::OutOfRange(value))
    }

    pub fn from_usdc(value: Decimal) -> Result<Self, AmountError> {
        Self::from_decimal(value, USDC_DECIMALS)
    }

    pub fn parse(text: &str) -> Result<Self, AmountError> {
        text.trim()
            .parse::<i128>()
            .map(Self)
            .map_err(|_| AmountError::InvalidInteger(text.to_string()))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TokenAmount {
    fn from(units: i64) -> Self {
        Self(units as i128)
    }
}

impl From<TokenAmount> for String {
    fn from(amount: TokenAmount) -> Self {
        amount.0.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Text(String),
    Int(i64),
}

impl TryFrom<RawAmount> for TokenAmount {
    type Error = AmountError;

    fn try_from(raw: RawAmount) -> Result<Self, Self::Error> {
        match raw {
            RawAmount::Text(text) => TokenAmount::parse(&text),
            RawAmount::Int(units) => Ok(TokenAmount::from(units)),
        }
    }
}

// 1.3: millisecond timestamp. the highlight timer runs on these so tests can drive the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn plus_millis(&self, ms: i64) -> Self {
        Self(self.0.saturating_add(ms))
    }
}
