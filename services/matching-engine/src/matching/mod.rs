//! Matching logic
//!
//! Split into crossing detection (when two prices can trade) and fill
//! planning (which fills one batch scan produces).

pub mod crossing;
pub mod planner;

pub use planner::{plan_matches, Fill, MatchPlan};
