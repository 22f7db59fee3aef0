// 8.0.2: result types and errors for view operations.

use crate::cache::CacheError;
use crate::config::ConfigError;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshResult {
    pub rows: usize,
    pub base_price: Option<Decimal>,
    /// Rows flagged by this refresh. Zero when nothing grew.
    pub highlighted: usize,
    pub scroll_to: Option<Decimal>,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("View has been torn down")]
    TornDown,
}
