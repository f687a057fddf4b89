//! Fill planning
//!
//! Turns one fetched batch of resting orders into a list of fills for an
//! incoming taker. Pure with respect to storage: the scan works entirely
//! on the orders handed in, so the surrounding transaction can do all of
//! its reads before any write is staged.

use crate::matching::crossing;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use types::numeric::{Price, Shares};
use types::order::Order;

/// One planned fill against a resting maker
#[derive(Debug, Clone)]
pub struct Fill {
    /// Maker order with the fill already applied
    pub maker_after: Order,
    pub qty: Shares,
    /// Midpoint of the two limit prices
    pub price: Decimal,
}

/// Everything one matching pass decided
#[derive(Debug, Clone, Default)]
pub struct MatchPlan {
    pub fills: Vec<Fill>,
}

impl MatchPlan {
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Price of the final fill, the market's new `last_price`
    pub fn last_price(&self) -> Option<Decimal> {
        self.fills.last().map(|f| f.price)
    }
}

/// Scan `batch` in priority order and fill `taker` as far as it goes
///
/// The batch must already be sorted best price first with arrival order as
/// tie-break. Candidates from the taker's own team are skipped without
/// ending the scan; the first non-crossing candidate ends it, since the
/// sort guarantees nothing behind it can cross. At most `max_matches`
/// fills are produced; whatever quantity is left after that rests open.
///
/// The taker is mutated in place: its remainder drains and its status
/// flips to filled when it reaches zero.
pub fn plan_matches(
    taker: &mut Order,
    batch: &[Order],
    max_matches: usize,
    now: DateTime<Utc>,
) -> MatchPlan {
    let mut fills = Vec::new();

    for maker in batch {
        if taker.shares_remaining.is_zero() || fills.len() >= max_matches {
            break;
        }

        // Self-trade: skip without terminating the scan, a later candidate
        // from another team may still cross.
        if maker.team_id == taker.team_id {
            continue;
        }
        if !maker.is_open() || maker.shares_remaining.is_zero() {
            continue;
        }
        if !crossing::taker_crosses(taker.side, taker.price, maker.price) {
            break;
        }

        let qty = taker.shares_remaining.min(maker.shares_remaining);
        let price = Price::midpoint(taker.price, maker.price);

        let mut maker_after = maker.clone();
        maker_after.apply_fill(qty, now);
        taker.apply_fill(qty, now);

        fills.push(Fill {
            maker_after,
            qty,
            price,
        });
    }

    MatchPlan { fills }
}
