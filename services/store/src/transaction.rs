//! Transaction handle
//!
//! A [`Transaction`] is handed to the body closure by
//! [`crate::MemoryStore::run_transaction`]. Reads go against the latest
//! committed shelf and are recorded (version or absence, query
//! fingerprints); writes are staged and invisible until commit. Once any
//! write is staged, further reads fail: the ordering contract is all reads
//! first, then all writes, and the store refuses to let code compile-in a
//! dependency on anything laxer.
//!
//! Reads between two calls may observe different commits; commit-time
//! validation of the entire read set rejects any execution that saw a torn
//! view, so the attempt that commits is equivalent to one that ran against
//! a single snapshot.

use crate::error::StoreError;
use crate::shelf::{ReadCheck, Shelf, Versioned, WriteOp};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;
use types::events::GameEvent;
use types::game::Game;
use types::ids::{GameId, MarketId, OrderId, TeamId, UserId};
use types::leaderboard::SeasonLeaderboard;
use types::market::Market;
use types::order::{Order, Side};
use types::team::{PlayerMembership, Team};
use types::trade::Trade;
use types::user::User;

pub struct Transaction<'a> {
    shelf: &'a RwLock<Shelf>,
    reads: Vec<ReadCheck>,
    writes: Vec<WriteOp>,
    wrote: bool,
    now: DateTime<Utc>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(shelf: &'a RwLock<Shelf>) -> Self {
        Self {
            shelf,
            reads: Vec::new(),
            writes: Vec::new(),
            wrote: false,
            now: Utc::now(),
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<ReadCheck>, Vec<WriteOp>) {
        (self.reads, self.writes)
    }

    /// Attempt-stable timestamp for every document this body writes
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    // ── Reads ───────────────────────────────────────────────────────

    fn guard_read(&self) -> Result<(), StoreError> {
        if self.wrote {
            return Err(StoreError::ReadAfterWrite);
        }
        Ok(())
    }

    fn with_shelf<T>(&self, f: impl FnOnce(&Shelf) -> T) -> T {
        let shelf = self.shelf.read().expect("store lock poisoned");
        f(&shelf)
    }

    pub fn get_game(&mut self, id: &GameId) -> Result<Option<Game>, StoreError> {
        self.guard_read()?;
        let held = self.with_shelf(|s| s.games.get(id).map(cloned));
        self.reads
            .push(ReadCheck::Game(id.clone(), held.as_ref().map(|h| h.1)));
        Ok(held.map(|h| h.0))
    }

    pub fn get_user(&mut self, id: &UserId) -> Result<Option<User>, StoreError> {
        self.guard_read()?;
        let held = self.with_shelf(|s| s.users.get(id).map(cloned));
        self.reads
            .push(ReadCheck::User(id.clone(), held.as_ref().map(|h| h.1)));
        Ok(held.map(|h| h.0))
    }

    pub fn get_team(&mut self, game: &GameId, team: &TeamId) -> Result<Option<Team>, StoreError> {
        self.guard_read()?;
        let held = self.with_shelf(|s| s.teams.get(&(game.clone(), *team)).map(cloned));
        self.reads.push(ReadCheck::Team(
            game.clone(),
            *team,
            held.as_ref().map(|h| h.1),
        ));
        Ok(held.map(|h| h.0))
    }

    pub fn get_player(
        &mut self,
        game: &GameId,
        team: &TeamId,
        uid: &UserId,
    ) -> Result<Option<PlayerMembership>, StoreError> {
        self.guard_read()?;
        let held =
            self.with_shelf(|s| s.players.get(&(game.clone(), *team, uid.clone())).map(cloned));
        self.reads.push(ReadCheck::Player(
            game.clone(),
            *team,
            uid.clone(),
            held.as_ref().map(|h| h.1),
        ));
        Ok(held.map(|h| h.0))
    }

    pub fn get_market(
        &mut self,
        game: &GameId,
        market: &MarketId,
    ) -> Result<Option<Market>, StoreError> {
        self.guard_read()?;
        let held = self.with_shelf(|s| s.markets.get(&(game.clone(), market.clone())).map(cloned));
        self.reads.push(ReadCheck::Market(
            game.clone(),
            market.clone(),
            held.as_ref().map(|h| h.1),
        ));
        Ok(held.map(|h| h.0))
    }

    pub fn get_order(
        &mut self,
        game: &GameId,
        market: &MarketId,
        order: &OrderId,
    ) -> Result<Option<Order>, StoreError> {
        self.guard_read()?;
        let held = self.with_shelf(|s| {
            s.orders
                .get(&(game.clone(), market.clone(), *order))
                .map(cloned)
        });
        self.reads.push(ReadCheck::Order(
            game.clone(),
            market.clone(),
            *order,
            held.as_ref().map(|h| h.1),
        ));
        Ok(held.map(|h| h.0))
    }

    pub fn get_leaderboard(
        &mut self,
        season: &str,
    ) -> Result<Option<SeasonLeaderboard>, StoreError> {
        self.guard_read()?;
        let held = self.with_shelf(|s| s.leaderboards.get(season).map(cloned));
        self.reads.push(ReadCheck::Leaderboard(
            season.to_string(),
            held.as_ref().map(|h| h.1),
        ));
        Ok(held.map(|h| h.0))
    }

    /// The bounded matching batch: open orders of `side`, best price
    /// first, then arrival order
    pub fn open_orders(
        &mut self,
        game: &GameId,
        market: &MarketId,
        side: Side,
        limit: usize,
    ) -> Result<Vec<Order>, StoreError> {
        self.guard_read()?;
        let hits = self.with_shelf(|s| s.open_orders(game, market, side, limit));
        self.reads.push(ReadCheck::OpenOrders {
            game: game.clone(),
            market: market.clone(),
            side,
            limit,
            fingerprint: hits.iter().map(|(id, ver, _)| (*id, *ver)).collect(),
        });
        Ok(hits.into_iter().map(|(_, _, o)| o).collect())
    }

    pub fn team_by_name(
        &mut self,
        game: &GameId,
        name: &str,
    ) -> Result<Option<Team>, StoreError> {
        self.guard_read()?;
        let found = self.with_shelf(|s| s.team_by_name(game, name));
        self.reads.push(ReadCheck::TeamByName {
            game: game.clone(),
            name: name.to_string(),
            found: found.as_ref().map(|(id, ver, _)| (*id, *ver)),
        });
        Ok(found.map(|(_, _, t)| t))
    }

    // ── Writes ──────────────────────────────────────────────────────

    fn stage(&mut self, op: WriteOp) {
        self.wrote = true;
        self.writes.push(op);
    }

    pub fn put_game(&mut self, game: Game) {
        self.stage(WriteOp::PutGame(game.id.clone(), game));
    }

    pub fn put_user(&mut self, id: UserId, user: User) {
        self.stage(WriteOp::PutUser(id, user));
    }

    pub fn put_team(&mut self, game: &GameId, team: Team) {
        self.stage(WriteOp::PutTeam(game.clone(), team.id, team));
    }

    pub fn put_player(&mut self, game: &GameId, team: &TeamId, player: PlayerMembership) {
        self.stage(WriteOp::PutPlayer(
            game.clone(),
            *team,
            player.uid.clone(),
            player,
        ));
    }

    pub fn delete_player(&mut self, game: &GameId, team: &TeamId, uid: &UserId) {
        self.stage(WriteOp::DeletePlayer(game.clone(), *team, uid.clone()));
    }

    pub fn put_market(&mut self, game: &GameId, market: Market) {
        self.stage(WriteOp::PutMarket(game.clone(), market.id.clone(), market));
    }

    pub fn put_order(&mut self, game: &GameId, market: &MarketId, order: Order) {
        self.stage(WriteOp::PutOrder(
            game.clone(),
            market.clone(),
            order.id,
            order,
        ));
    }

    pub fn put_trade(&mut self, game: &GameId, trade: Trade) {
        self.stage(WriteOp::PutTrade(
            game.clone(),
            trade.market_id.clone(),
            trade.id,
            trade,
        ));
    }

    pub fn put_event(&mut self, game: &GameId, event: GameEvent) {
        self.stage(WriteOp::PutEvent(game.clone(), event.id, event));
    }

    pub fn put_leaderboard(&mut self, season: &str, board: SeasonLeaderboard) {
        self.stage(WriteOp::PutLeaderboard(season.to_string(), board));
    }
}

fn cloned<T: Clone>(v: &Versioned<T>) -> (T, u64) {
    (v.value.clone(), v.version)
}

/// Validate every recorded read against the current shelf
pub(crate) fn reads_still_valid(shelf: &Shelf, reads: &[ReadCheck]) -> bool {
    reads.iter().all(|r| shelf.still_valid(r))
}

/// Collapse staged writes so the last write to a key wins, preserving op order
///
/// A body may stage the same document twice (create then finalize); only
/// the final image is applied.
pub(crate) fn coalesce(writes: Vec<WriteOp>) -> Vec<WriteOp> {
    let mut last_for_key: BTreeMap<String, usize> = BTreeMap::new();
    for (idx, op) in writes.iter().enumerate() {
        last_for_key.insert(write_key(op), idx);
    }
    writes
        .into_iter()
        .enumerate()
        .filter(|(idx, op)| last_for_key.get(&write_key(op)) == Some(idx))
        .map(|(_, op)| op)
        .collect()
}

fn write_key(op: &WriteOp) -> String {
    match op {
        WriteOp::PutGame(id, _) => format!("game/{}", id),
        WriteOp::PutUser(id, _) => format!("user/{}", id),
        WriteOp::PutTeam(g, t, _) => format!("team/{}/{}", g, t),
        WriteOp::PutPlayer(g, t, u, _) | WriteOp::DeletePlayer(g, t, u) => {
            format!("player/{}/{}/{}", g, t, u)
        }
        WriteOp::PutMarket(g, m, _) => format!("market/{}/{}", g, m),
        WriteOp::PutOrder(g, m, o, _) => format!("order/{}/{}/{}", g, m, o),
        WriteOp::PutTrade(g, m, t, _) => format!("trade/{}/{}/{}", g, m, t),
        WriteOp::PutEvent(g, e, _) => format!("event/{}/{}", g, e),
        WriteOp::PutLeaderboard(season, _) => format!("leaderboard/{}", season),
    }
}
