//! In-memory document store with serializable transactions
//!
//! [`MemoryStore`] keeps one [`Shelf`] behind an `RwLock` and exposes three
//! access paths:
//!
//! * [`MemoryStore::run_transaction`]: optimistic transactions. The body
//!   reads through a [`Transaction`], stages writes, and returns; commit
//!   validates the full read set under the write lock and applies the
//!   writes atomically, retrying the body on conflict up to
//!   [`StoreConfig::max_txn_attempts`] times. A body error aborts with no
//!   retry.
//! * [`MemoryStore::batch`]: atomic blind writes with no reads and no
//!   validation, for bulk phases that own their documents.
//! * snapshot getters and listers: single-document and whole-collection
//!   reads outside any transaction, for serving and reporting paths that
//!   tolerate a point-in-time view.

use crate::error::StoreError;
use crate::shelf::{Shelf, WriteOp};
use crate::transaction::{coalesce, reads_still_valid, Transaction};
use std::sync::RwLock;
use types::errors::ServiceError;
use types::events::GameEvent;
use types::game::Game;
use types::ids::{GameId, MarketId, OrderId, TeamId, UserId};
use types::leaderboard::SeasonLeaderboard;
use types::market::Market;
use types::order::Order;
use types::team::{PlayerMembership, Team};
use types::trade::Trade;
use types::user::User;

/// Store tuning knobs
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Transaction body attempts before giving up on contention
    pub max_txn_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_txn_attempts: 5,
        }
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    shelf: RwLock<Shelf>,
    config: StoreConfig,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl MemoryStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            shelf: RwLock::new(Shelf::default()),
            config,
        }
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Run `body` as a serializable transaction
    ///
    /// The body may run more than once; it must not carry side effects
    /// beyond the transaction handle. `Err` from the body aborts the
    /// transaction immediately and is returned as-is, with nothing
    /// written. Conflicts retry; exhausting the attempt budget surfaces
    /// as an internal error.
    pub fn run_transaction<T>(
        &self,
        mut body: impl FnMut(&mut Transaction<'_>) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        for attempt in 1..=self.config.max_txn_attempts {
            let mut tx = Transaction::begin(&self.shelf);
            let out = body(&mut tx)?;
            let (reads, writes) = tx.into_parts();

            let mut shelf = self.shelf.write().expect("store lock poisoned");
            if reads_still_valid(&shelf, &reads) {
                if !writes.is_empty() {
                    shelf.apply(coalesce(writes));
                }
                return Ok(out);
            }
            drop(shelf);
            tracing::debug!(attempt, "transaction read set went stale, retrying");
        }
        Err(StoreError::AttemptsExhausted {
            attempts: self.config.max_txn_attempts,
        }
        .into())
    }

    /// Start an atomic write batch
    pub fn batch(&self) -> WriteBatch<'_> {
        WriteBatch {
            shelf: &self.shelf,
            writes: Vec::new(),
        }
    }

    // ── Snapshot reads ──────────────────────────────────────────────

    fn read<T>(&self, f: impl FnOnce(&Shelf) -> T) -> T {
        let shelf = self.shelf.read().expect("store lock poisoned");
        f(&shelf)
    }

    pub fn get_game(&self, id: &GameId) -> Option<Game> {
        self.read(|s| s.games.get(id).map(|v| v.value.clone()))
    }

    pub fn get_user(&self, id: &UserId) -> Option<User> {
        self.read(|s| s.users.get(id).map(|v| v.value.clone()))
    }

    pub fn get_team(&self, game: &GameId, team: &TeamId) -> Option<Team> {
        self.read(|s| s.teams.get(&(game.clone(), *team)).map(|v| v.value.clone()))
    }

    pub fn get_market(&self, game: &GameId, market: &MarketId) -> Option<Market> {
        self.read(|s| {
            s.markets
                .get(&(game.clone(), market.clone()))
                .map(|v| v.value.clone())
        })
    }

    pub fn get_order(&self, game: &GameId, market: &MarketId, order: &OrderId) -> Option<Order> {
        self.read(|s| {
            s.orders
                .get(&(game.clone(), market.clone(), *order))
                .map(|v| v.value.clone())
        })
    }

    pub fn get_leaderboard(&self, season: &str) -> Option<SeasonLeaderboard> {
        self.read(|s| s.leaderboards.get(season).map(|v| v.value.clone()))
    }

    pub fn list_games(&self) -> Vec<Game> {
        self.read(|s| seq_ordered(s.games.values()))
    }

    pub fn list_markets(&self, game: &GameId) -> Vec<Market> {
        self.read(|s| {
            seq_ordered(
                s.markets
                    .iter()
                    .filter(|((g, _), _)| g == game)
                    .map(|(_, v)| v),
            )
        })
    }

    pub fn list_teams(&self, game: &GameId) -> Vec<Team> {
        self.read(|s| {
            seq_ordered(
                s.teams
                    .iter()
                    .filter(|((g, _), _)| g == game)
                    .map(|(_, v)| v),
            )
        })
    }

    pub fn list_players(&self, game: &GameId, team: &TeamId) -> Vec<PlayerMembership> {
        self.read(|s| {
            seq_ordered(
                s.players
                    .iter()
                    .filter(|((g, t, _), _)| g == game && t == team)
                    .map(|(_, v)| v),
            )
        })
    }

    pub fn list_orders(&self, game: &GameId, market: &MarketId) -> Vec<Order> {
        self.read(|s| {
            seq_ordered(
                s.orders
                    .iter()
                    .filter(|((g, m, _), _)| g == game && m == market)
                    .map(|(_, v)| v),
            )
        })
    }

    pub fn list_trades(&self, game: &GameId, market: &MarketId) -> Vec<Trade> {
        self.read(|s| {
            seq_ordered(
                s.trades
                    .iter()
                    .filter(|((g, m, _), _)| g == game && m == market)
                    .map(|(_, v)| v),
            )
        })
    }

    pub fn list_events(&self, game: &GameId) -> Vec<GameEvent> {
        self.read(|s| {
            seq_ordered(
                s.events
                    .iter()
                    .filter(|((g, _), _)| g == game)
                    .map(|(_, v)| v),
            )
        })
    }
}

fn seq_ordered<'a, T: Clone + 'a>(
    values: impl Iterator<Item = &'a crate::shelf::Versioned<T>>,
) -> Vec<T> {
    let mut held: Vec<_> = values.map(|v| (v.seq, v.value.clone())).collect();
    held.sort_by_key(|(seq, _)| *seq);
    held.into_iter().map(|(_, value)| value).collect()
}

/// Atomic multi-document write with no reads
///
/// Writes stage locally and nothing is visible until [`WriteBatch::commit`],
/// which applies them in one commit. There is no validation step; callers
/// use batches only on paths where no concurrent writer can touch the same
/// documents.
pub struct WriteBatch<'a> {
    shelf: &'a RwLock<Shelf>,
    writes: Vec<WriteOp>,
}

impl WriteBatch<'_> {
    pub fn put_game(&mut self, game: Game) {
        self.writes.push(WriteOp::PutGame(game.id.clone(), game));
    }

    pub fn put_user(&mut self, id: UserId, user: User) {
        self.writes.push(WriteOp::PutUser(id, user));
    }

    pub fn put_team(&mut self, game: &GameId, team: Team) {
        self.writes.push(WriteOp::PutTeam(game.clone(), team.id, team));
    }

    pub fn put_player(&mut self, game: &GameId, team: &TeamId, player: PlayerMembership) {
        self.writes.push(WriteOp::PutPlayer(
            game.clone(),
            *team,
            player.uid.clone(),
            player,
        ));
    }

    pub fn put_market(&mut self, game: &GameId, market: Market) {
        self.writes
            .push(WriteOp::PutMarket(game.clone(), market.id.clone(), market));
    }

    pub fn put_order(&mut self, game: &GameId, market: &MarketId, order: Order) {
        self.writes.push(WriteOp::PutOrder(
            game.clone(),
            market.clone(),
            order.id,
            order,
        ));
    }

    pub fn put_trade(&mut self, game: &GameId, trade: Trade) {
        self.writes.push(WriteOp::PutTrade(
            game.clone(),
            trade.market_id.clone(),
            trade.id,
            trade,
        ));
    }

    pub fn put_event(&mut self, game: &GameId, event: GameEvent) {
        self.writes.push(WriteOp::PutEvent(game.clone(), event.id, event));
    }

    pub fn put_leaderboard(&mut self, season: &str, board: SeasonLeaderboard) {
        self.writes
            .push(WriteOp::PutLeaderboard(season.to_string(), board));
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn commit(self) {
        if self.writes.is_empty() {
            return;
        }
        let mut shelf = self.shelf.write().expect("store lock poisoned");
        shelf.apply(coalesce(self.writes));
    }
}
