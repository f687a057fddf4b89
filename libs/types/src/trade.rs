//! Trade records
//!
//! A trade is written once at match time and never mutated afterwards. The
//! settlement engine reconstructs all pnl from trades alone: an order can
//! fill across several midpoints, so order records cannot recover the
//! price each share actually traded at.

use crate::ids::{MarketId, OrderId, TeamId, TradeId, UserId};
use crate::numeric::Shares;
use crate::order::{Order, Side};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One side's identity on a trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeParty {
    pub user_id: UserId,
    pub team_id: TeamId,
}

impl TradeParty {
    pub fn of(order: &Order) -> Self {
        Self {
            user_id: order.user_id.clone(),
            team_id: order.team_id,
        }
    }
}

/// An executed fill between one maker and one taker order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub market_id: MarketId,

    /// Midpoint of the two limit prices
    pub price: Decimal,
    pub qty: Shares,

    // Order references by side
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,

    pub buyer: TradeParty,
    pub seller: TradeParty,

    // Same two orders again, attributed by book role
    pub maker_order_id: OrderId,
    pub taker_order_id: OrderId,

    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// Record a fill of `qty` at `price` between the incoming taker and a
    /// resting maker, mapping buy/sell references from the taker's side
    pub fn between(
        id: TradeId,
        market_id: MarketId,
        taker: &Order,
        maker: &Order,
        price: Decimal,
        qty: Shares,
        now: DateTime<Utc>,
    ) -> Self {
        let (buy, sell) = match taker.side {
            Side::Buy => (taker, maker),
            Side::Sell => (maker, taker),
        };
        Self {
            id,
            market_id,
            price,
            qty,
            buy_order_id: buy.id,
            sell_order_id: sell.id,
            buyer: TradeParty::of(buy),
            seller: TradeParty::of(sell),
            maker_order_id: maker.id,
            taker_order_id: taker.id,
            created_at: now,
        }
    }

    /// Trades between two orders of one team are forbidden upstream; this
    /// is the recorded form of that invariant
    pub fn involves_distinct_teams(&self) -> bool {
        self.buyer.team_id != self.seller.team_id
    }

    /// Notional value (price × qty)
    pub fn notional(&self) -> Decimal {
        self.price * self.qty.as_decimal()
    }
}
