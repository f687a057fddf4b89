//! Matching engine core
//!
//! Order placement and cancellation against the transactional store. Each
//! call is one transaction: read the game, the market, and one bounded
//! batch of opposing orders, then stage every write the fill plan implies.

use crate::matching::{plan_matches, MatchPlan};
use rust_decimal::Decimal;
use std::sync::Arc;
use store::{MemoryStore, Transaction};
use types::auth::Caller;
use types::errors::ServiceError;
use types::game::GameStatus;
use types::ids::{MarketId, OrderId, TradeId, UserId};
use types::market::Market;
use types::numeric::{Price, Shares};
use types::order::{Order, Side};
use types::trade::Trade;
use types::user::CurrentGame;

/// Matching knobs
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Fills allowed per placement before the remainder rests open
    pub max_matches: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self { max_matches: 25 }
    }
}

impl MatchConfig {
    /// Opposing orders fetched per placement
    ///
    /// Larger than `max_matches` so the scan can skip self-trade and stale
    /// candidates and still find enough fills in one read.
    pub fn batch_limit(&self) -> usize {
        usize::max(50, self.max_matches * 2)
    }
}

/// Main matching engine
#[derive(Debug)]
pub struct MatchingEngine {
    store: Arc<MemoryStore>,
    config: MatchConfig,
}

impl MatchingEngine {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self::with_config(store, MatchConfig::default())
    }

    pub fn with_config(store: Arc<MemoryStore>, config: MatchConfig) -> Self {
        Self { store, config }
    }

    /// Place a limit order and match it against the resting book
    ///
    /// The caller must be joined to a game and the game must be active.
    /// Matching considers a single fetched batch; quantity that could only
    /// match deeper in the book is left resting open, and the caller may
    /// place again to keep matching.
    pub fn place_order(
        &self,
        caller: &Caller,
        market_id: &MarketId,
        side: &str,
        price: Decimal,
        shares: i64,
    ) -> Result<OrderId, ServiceError> {
        let uid = caller.require()?.clone();
        let side = Side::parse(side)
            .ok_or_else(|| ServiceError::invalid_argument("invalid side"))?;
        let price = Price::try_new(price)
            .ok_or_else(|| ServiceError::invalid_argument("invalid price"))?;
        if shares <= 0 || shares > i64::from(u32::MAX) {
            return Err(ServiceError::invalid_argument("invalid shares"));
        }
        let shares = Shares::new(shares as u32);

        let cg = self.current_game(&uid)?;
        let order_id = OrderId::new();

        let fills = self.store.run_transaction(|tx| {
            self.place_in_tx(tx, &uid, &cg, market_id, order_id, side, price, shares)
        })?;

        tracing::debug!(
            game = %cg.game_id,
            market = %market_id,
            order = %order_id,
            side = side.as_str(),
            fills,
            "order placed"
        );
        Ok(order_id)
    }

    #[allow(clippy::too_many_arguments)]
    fn place_in_tx(
        &self,
        tx: &mut Transaction<'_>,
        uid: &UserId,
        cg: &CurrentGame,
        market_id: &MarketId,
        order_id: OrderId,
        side: Side,
        price: Price,
        shares: Shares,
    ) -> Result<usize, ServiceError> {
        // Reads come first; the store rejects any read staged after a write.
        let game = tx
            .get_game(&cg.game_id)?
            .ok_or_else(|| ServiceError::not_found("game"))?;
        if game.status != GameStatus::Active {
            return Err(ServiceError::failed_precondition("game not active"));
        }

        let mut market = tx
            .get_market(&cg.game_id, market_id)?
            .ok_or_else(|| ServiceError::not_found("market"))?;

        let batch = tx.open_orders(
            &cg.game_id,
            market_id,
            side.opposite(),
            self.config.batch_limit(),
        )?;

        let now = tx.now();
        let mut taker = Order::new(order_id, uid.clone(), cg.team_id, side, price, shares, now);
        let plan = plan_matches(&mut taker, &batch, self.config.max_matches, now);

        tx.put_order(&cg.game_id, market_id, taker.clone());
        for fill in &plan.fills {
            tx.put_order(&cg.game_id, market_id, fill.maker_after.clone());
            tx.put_trade(
                &cg.game_id,
                Trade::between(
                    TradeId::new(),
                    market_id.clone(),
                    &taker,
                    &fill.maker_after,
                    fill.price,
                    fill.qty,
                    now,
                ),
            );
        }

        if update_summary(&mut market, &taker, &plan) {
            tx.put_market(&cg.game_id, market);
        }

        Ok(plan.fills.len())
    }

    /// Cancel one of the caller's own open orders
    pub fn cancel_order(
        &self,
        caller: &Caller,
        market_id: &MarketId,
        order_id: &OrderId,
    ) -> Result<(), ServiceError> {
        let uid = caller.require()?.clone();
        let cg = self.current_game(&uid)?;

        self.store.run_transaction(|tx| {
            let mut order = tx
                .get_order(&cg.game_id, market_id, order_id)?
                .ok_or_else(|| ServiceError::not_found("order"))?;
            if order.user_id != uid {
                return Err(ServiceError::permission_denied("not your order"));
            }
            if !order.is_open() {
                return Err(ServiceError::failed_precondition("order not open"));
            }
            order.cancel(tx.now());
            tx.put_order(&cg.game_id, market_id, order);
            Ok(())
        })?;

        tracing::debug!(game = %cg.game_id, market = %market_id, order = %order_id, "order cancelled");
        Ok(())
    }

    /// Resolve the caller's current game pointer outside the transaction
    fn current_game(&self, uid: &UserId) -> Result<CurrentGame, ServiceError> {
        self.store
            .get_user(uid)
            .and_then(|user| user.current_game)
            .ok_or_else(|| ServiceError::failed_precondition("user not in a game"))
    }
}

/// Apply the book-summary approximation; returns whether anything changed
///
/// `last_price` moves on any fill. `best_bid`/`best_ask` only tighten,
/// and only when the taker actually rests: a fully filled taker never
/// contributes to the book.
fn update_summary(market: &mut Market, taker: &Order, plan: &MatchPlan) -> bool {
    let mut changed = false;
    if let Some(last) = plan.last_price() {
        market.note_last_price(last);
        changed = true;
    }
    if taker.is_open() {
        match taker.side {
            Side::Buy => market.tighten_bid(taker.price),
            Side::Sell => market.tighten_ask(taker.price),
        }
        changed = true;
    }
    changed
}
