//! Crossing detection logic
//!
//! Determines when an incoming order and a resting order can trade based
//! on price compatibility

use types::numeric::Price;
use types::order::Side;

/// Check if a bid and ask can match at given prices
///
/// For a buy order to match with a sell order:
/// - Buy price must be >= sell price
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming taker can match against a resting maker
///
/// Returns true if the taker's limit price crosses the maker's. The book
/// batch is sorted best price first, so the first maker that fails this
/// test ends the scan: no later candidate can cross either.
pub fn taker_crosses(taker_side: Side, taker_price: Price, maker_price: Price) -> bool {
    match taker_side {
        Side::Buy => taker_price >= maker_price, // buy crosses sell if bid >= ask
        Side::Sell => taker_price <= maker_price, // sell crosses buy if ask <= bid
    }
}
