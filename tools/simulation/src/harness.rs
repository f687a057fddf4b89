//! Full-stack game harness
//!
//! Wires one store behind real lifecycle, matching, and settlement engines
//! and drives a complete game through their public surfaces only. Anything
//! a bot or test does here goes through the same validation and
//! transactions a production caller would hit.

use lifecycle::GameLifecycle;
use matching_engine::MatchingEngine;
use rust_decimal::Decimal;
use settlement::{CloseOutcome, SettlementEngine};
use std::sync::Arc;
use store::{MemoryStore, StoreConfig};
use types::auth::Caller;
use types::errors::ServiceError;
use types::events::GameEvent;
use types::game::Game;
use types::ids::{GameId, MarketId, OrderId};
use types::trade::Trade;

/// Harness configuration
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub kind: &'static str,
    pub visibility: &'static str,
    pub season: Option<&'static str>,
    /// Seed for the lifecycle event RNG
    pub seed: u64,
    /// Store retry budget; contention tests raise it
    pub max_txn_attempts: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            kind: "dice",
            visibility: "unofficial",
            season: None,
            seed: 0,
            max_txn_attempts: StoreConfig::default().max_txn_attempts,
        }
    }
}

/// One live game wired through the real service stack
#[derive(Debug)]
pub struct GameSim {
    pub store: Arc<MemoryStore>,
    pub lifecycle: GameLifecycle,
    pub matching: MatchingEngine,
    pub settlement: SettlementEngine,
    pub game_id: GameId,
}

impl GameSim {
    /// Create a game, seat the whole `(player, team)` roster, and start it
    pub fn start(config: SimConfig, roster: &[(&str, &str)]) -> Result<Self, ServiceError> {
        let store = Arc::new(MemoryStore::new(StoreConfig {
            max_txn_attempts: config.max_txn_attempts,
        }));
        let lifecycle = GameLifecycle::with_seed(Arc::clone(&store), config.seed);
        let matching = MatchingEngine::new(Arc::clone(&store));
        let settlement = SettlementEngine::new(Arc::clone(&store));

        let (host, _) = roster
            .first()
            .copied()
            .ok_or_else(|| ServiceError::invalid_argument("empty roster"))?;
        let game_id = lifecycle.create_game(
            &Self::caller(host),
            config.kind,
            config.season,
            config.visibility,
        )?;
        for &(player, team) in roster {
            lifecycle.join_game(&Self::caller(player), &game_id, team, None)?;
        }
        lifecycle.start_game(&Self::caller(host))?;

        Ok(Self {
            store,
            lifecycle,
            matching,
            settlement,
            game_id,
        })
    }

    pub fn caller(player: &str) -> Caller {
        Caller::authenticated(player)
    }

    /// Market symbols for this game, in definition order
    pub fn symbols(&self) -> Vec<MarketId> {
        self.store
            .list_markets(&self.game_id)
            .into_iter()
            .map(|market| market.id)
            .collect()
    }

    pub fn tick(&self, player: &str) -> Result<GameEvent, ServiceError> {
        self.lifecycle.tick_game(&Self::caller(player))
    }

    pub fn place(
        &self,
        player: &str,
        symbol: &MarketId,
        side: &str,
        price: Decimal,
        shares: i64,
    ) -> Result<OrderId, ServiceError> {
        self.matching
            .place_order(&Self::caller(player), symbol, side, price, shares)
    }

    pub fn cancel(
        &self,
        player: &str,
        symbol: &MarketId,
        order_id: &OrderId,
    ) -> Result<(), ServiceError> {
        self.matching
            .cancel_order(&Self::caller(player), symbol, order_id)
    }

    pub fn close(&self, player: &str) -> Result<CloseOutcome, ServiceError> {
        self.settlement.close_game(&Self::caller(player))
    }

    pub fn game(&self) -> Option<Game> {
        self.store.get_game(&self.game_id)
    }

    pub fn trades(&self, symbol: &MarketId) -> Vec<Trade> {
        self.store.list_trades(&self.game_id, symbol)
    }

    /// Every trade in the game, grouped by market in definition order
    pub fn all_trades(&self) -> Vec<Trade> {
        self.symbols()
            .iter()
            .flat_map(|symbol| self.trades(symbol))
            .collect()
    }
}
