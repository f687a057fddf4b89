//! Matching Engine Service
//!
//! Continuous double-auction matching with price-time priority. Orders are
//! placed one at a time; each placement runs as a single store transaction
//! that reads one bounded batch of opposing orders and stages every
//! resulting fill.
//!
//! **Key Invariants:**
//! - Price-time priority: best price first, arrival order as tie-break
//! - Trades execute at the midpoint of the two limit prices
//! - No trade between orders of the same team; such candidates are
//!   skipped, not treated as a scan terminator
//! - Bounded liquidity: one fetched batch per placement, at most
//!   [`MatchConfig::max_matches`] fills, the remainder rests open

pub mod engine;
pub mod matching;

pub use engine::{MatchConfig, MatchingEngine};
