// 8.0: order book view. coordinates cached indexer data, book aggregation, change
// highlighting and event fan-out. explicit calls over immutable snapshots, no I/O.

mod config;
mod core;
mod data;
mod refresh;
mod results;

pub use self::config::ViewConfig;
pub use self::core::OrderBookView;
pub use self::data::{ORDERS_QUERY, INDEX_QUERY, ORDER_BOOK_QUERY, POSITIONS_QUERY};
pub use self::results::{RefreshResult, ViewError};
