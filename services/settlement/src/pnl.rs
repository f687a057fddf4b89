//! Pnl accumulation from trade records
//!
//! Trades are the sole source of truth: each records the exact price and
//! quantity of one fill, so settlement replays every trade against the
//! final price. Each trade moves `(final_price - trade_price) * qty` from
//! the seller to the buyer, which makes the ledger zero-sum by
//! construction.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::ids::{TeamId, UserId};
use types::trade::{Trade, TradeParty};

const PRICE_CLAMP_MAX: u64 = 1_000_000_000;

/// Clamp a stored trade price into `[0, 1e9]` before pnl math
fn clamp_price(price: Decimal) -> Decimal {
    price.clamp(Decimal::ZERO, Decimal::from(PRICE_CLAMP_MAX))
}

/// Running pnl totals at team, player, and user granularity
///
/// Player totals are keyed by `(team, user)` so a user who somehow appears
/// on two rosters settles each membership separately.
#[derive(Debug, Default)]
pub struct PnlLedger {
    teams: BTreeMap<TeamId, Decimal>,
    players: BTreeMap<(TeamId, UserId), Decimal>,
    users: BTreeMap<UserId, Decimal>,
}

impl PnlLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one trade into the ledger at the given final price
    pub fn apply_trade(&mut self, trade: &Trade, final_price: Decimal) {
        let delta = (final_price - clamp_price(trade.price)) * trade.qty.as_decimal();
        self.credit(&trade.buyer, delta);
        self.credit(&trade.seller, -delta);
    }

    fn credit(&mut self, party: &TradeParty, delta: Decimal) {
        *self.teams.entry(party.team_id).or_default() += delta;
        *self
            .players
            .entry((party.team_id, party.user_id.clone()))
            .or_default() += delta;
        *self.users.entry(party.user_id.clone()).or_default() += delta;
    }

    /// Team total; zero if the team never traded
    pub fn team(&self, id: &TeamId) -> Decimal {
        self.teams.get(id).copied().unwrap_or(Decimal::ZERO)
    }

    /// Player total on one roster; zero if the member never traded
    pub fn player(&self, team_id: &TeamId, uid: &UserId) -> Decimal {
        self.players
            .get(&(*team_id, uid.clone()))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Every user that traded, with their cross-market total
    pub fn users(&self) -> impl Iterator<Item = (&UserId, Decimal)> {
        self.users.iter().map(|(uid, pnl)| (uid, *pnl))
    }
}
