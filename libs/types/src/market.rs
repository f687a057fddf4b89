//! Market documents and the book-summary approximation

use crate::ids::MarketId;
use crate::numeric::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One tradable symbol within a game
///
/// `best_bid`/`best_ask` are a summary, not a book recomputation: they
/// only tighten when a new order rests (`max` for bids, `min` for asks)
/// and are never widened when resting orders fill or cancel. Consumers
/// wanting exact top-of-book must derive it from open orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    pub best_bid: Option<Decimal>,
    pub best_ask: Option<Decimal>,
    pub last_price: Option<Decimal>,
    pub final_price: Option<Decimal>,
}

impl Market {
    pub fn new(id: MarketId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            best_bid: None,
            best_ask: None,
            last_price: None,
            final_price: None,
        }
    }

    /// Record the price of the most recent fill
    pub fn note_last_price(&mut self, price: Decimal) {
        self.last_price = Some(price);
    }

    /// Tighten the bid summary for a newly resting buy order
    pub fn tighten_bid(&mut self, price: Price) {
        let p = price.as_decimal();
        self.best_bid = Some(match self.best_bid {
            Some(cur) => cur.max(p),
            None => p,
        });
    }

    /// Tighten the ask summary for a newly resting sell order
    pub fn tighten_ask(&mut self, price: Price) {
        let p = price.as_decimal();
        self.best_ask = Some(match self.best_ask {
            Some(cur) => cur.min(p),
            None => p,
        });
    }
}
