//! Bot traders
//!
//! Two temperaments: [`quoter::Quoter`] rests two-sided liquidity around
//! the market's reference price, [`aggressor::Aggressor`] crosses it. Both
//! draw from their own seeded RNG, so a fixed seed set replays the exact
//! same order flow.

pub mod aggressor;
pub mod quoter;

use crate::harness::GameSim;
use rust_decimal::Decimal;
use types::ids::MarketId;

/// Price a bot anchors its next order on
///
/// Last trade if one printed, else the middle of the (approximate) touch,
/// else whichever side of the touch exists.
pub(crate) fn reference_price(sim: &GameSim, symbol: &MarketId) -> Option<Decimal> {
    let market = sim.store.get_market(&sim.game_id, symbol)?;
    market.last_price.or(match (market.best_bid, market.best_ask) {
        (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::from(2)),
        (bid, ask) => bid.or(ask),
    })
}

/// Floor a computed quote at the one-tick minimum the book accepts
pub(crate) fn at_least_one(price: Decimal) -> Decimal {
    if price < Decimal::ONE {
        Decimal::ONE
    } else {
        price
    }
}
