//! Settlement Service
//!
//! Closes a game: computes final market prices from the accumulated roll
//! sequence, replays every trade against them, and distributes the
//! resulting pnl to teams, roster members, and user balances. Official
//! games additionally merge into their season's running leaderboard.
//!
//! **Key Invariants:**
//! - Settlement runs at most once per game. A fencing transaction flips the
//!   game to `closing` with a `running` marker before any bulk work starts;
//!   concurrent close attempts fail or observe the finished result.
//! - Pnl is zero-sum per trade: the buyer's delta and the seller's delta
//!   cancel exactly, so team and user totals always sum to zero.
//! - The season merge is gated by the one-way `global_applied` flag and
//!   changes season totals exactly once no matter how often it is retried.
//! - Trades are the sole pnl input; orders are never consulted.

pub mod engine;
pub mod pnl;

pub use engine::{CloseOutcome, SettlementEngine};
pub use pnl::PnlLedger;
