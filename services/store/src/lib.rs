//! Transactional Document Store
//!
//! In-memory document store backing every game service: games, users,
//! teams, rosters, markets, orders, trades, events, and season
//! leaderboards, all behind one serializable-transaction surface.
//!
//! **Key Invariants:**
//! - All reads before all writes within a transaction
//! - Commit validates the entire read set (point versions and query
//!   fingerprints), so committed transactions are serializable
//! - Conflicts retry the body with a fresh view, bounded by
//!   [`StoreConfig::max_txn_attempts`]; business errors never retry
//! - Documents carry a store-wide arrival number, the meaning of
//!   "creation order" for books, rosters, and event logs

pub mod error;
pub mod store;
pub mod transaction;

mod shelf;

pub use error::StoreError;
pub use store::{MemoryStore, StoreConfig, WriteBatch};
pub use transaction::Transaction;
