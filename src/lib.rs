// hashbook-core: hashrate futures marketplace client core.
// margin math, order book ladder aggregation and change highlighting.
// all computation is deterministic; indexer and chain data are passed in.
//
// file map:
//   1.x  types.rs: primitives: ids, addresses, TokenAmount, Timestamp
//   2.x  order.rs: indexer records: Order, Position, HashrateIndexPoint
//   3.x  margin.rs: required margin, pnl, per-position and per-participant totals
//   4.x  order_book.rs: price ladder + live order counts, snapshot rows
//   5.x  highlighter.rs: snapshot diff, transient row highlights
//   6.x  events.rs: view events, collector, subscription bus
//   7.x  config.rs: book, margin, highlight, logging settings, env presets
//   7.1  logging.rs: tracing subscriber setup
//   8.x  view/: view coordinator: cache-backed refresh, timers, teardown
//   9.x  cache.rs: query cache keyed by name + params

pub mod cache;
pub mod config;
pub mod events;
pub mod highlighter;
pub mod logging;
pub mod margin;
pub mod order;
pub mod order_book;
pub mod types;
pub mod view;

// re exports for convenience
pub use cache::{CacheError, QueryCache, QueryKey, SharedCache};
pub use config::{AppConfig, BookConfig, ConfigError, Environment, LoggingConfig};
pub use events::*;
pub use highlighter::*;
pub use margin::*;
pub use order::*;
pub use order_book::*;
pub use types::*;
pub use view::*;
