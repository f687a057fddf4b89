//! The versioned document shelf
//!
//! One flat in-memory holder for every collection, guarded by the lock in
//! [`crate::MemoryStore`]. Each document carries two counters:
//!
//! - `version`: the commit that last wrote it, used by optimistic
//!   validation;
//! - `seq`: a store-wide arrival number stamped when the document is first
//!   committed, which is what "ascending creation order" means everywhere
//!   (wall-clock timestamps tie too easily to order a book by).

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use types::events::GameEvent;
use types::game::Game;
use types::ids::{EventId, GameId, MarketId, OrderId, TeamId, TradeId, UserId};
use types::leaderboard::SeasonLeaderboard;
use types::market::Market;
use types::order::{Order, OrderStatus, Side};
use types::team::{PlayerMembership, Team};
use types::trade::Trade;
use types::user::User;

// ── Versioned envelope ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) struct Versioned<T> {
    pub value: T,
    pub version: u64,
    pub seq: u64,
}

// ── Read checks and write ops ───────────────────────────────────────

/// One recorded read, replayable at commit time
///
/// Point reads record the observed version (`None` for absent documents);
/// query reads record a fingerprint of the whole result set so a phantom
/// row invalidates the transaction just like a changed row does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReadCheck {
    Game(GameId, Option<u64>),
    User(UserId, Option<u64>),
    Team(GameId, TeamId, Option<u64>),
    Player(GameId, TeamId, UserId, Option<u64>),
    Market(GameId, MarketId, Option<u64>),
    Order(GameId, MarketId, OrderId, Option<u64>),
    Leaderboard(String, Option<u64>),
    OpenOrders {
        game: GameId,
        market: MarketId,
        side: Side,
        limit: usize,
        fingerprint: Vec<(OrderId, u64)>,
    },
    TeamByName {
        game: GameId,
        name: String,
        found: Option<(TeamId, u64)>,
    },
}

/// One staged write, applied at commit
#[derive(Debug, Clone)]
pub(crate) enum WriteOp {
    PutGame(GameId, Game),
    PutUser(UserId, User),
    PutTeam(GameId, TeamId, Team),
    PutPlayer(GameId, TeamId, UserId, PlayerMembership),
    DeletePlayer(GameId, TeamId, UserId),
    PutMarket(GameId, MarketId, Market),
    PutOrder(GameId, MarketId, OrderId, Order),
    PutTrade(GameId, MarketId, TradeId, Trade),
    PutEvent(GameId, EventId, GameEvent),
    PutLeaderboard(String, SeasonLeaderboard),
}

// ── Shelf ───────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub(crate) struct Shelf {
    pub games: BTreeMap<GameId, Versioned<Game>>,
    pub users: BTreeMap<UserId, Versioned<User>>,
    pub teams: BTreeMap<(GameId, TeamId), Versioned<Team>>,
    pub players: BTreeMap<(GameId, TeamId, UserId), Versioned<PlayerMembership>>,
    pub markets: BTreeMap<(GameId, MarketId), Versioned<Market>>,
    pub orders: BTreeMap<(GameId, MarketId, OrderId), Versioned<Order>>,
    pub trades: BTreeMap<(GameId, MarketId, TradeId), Versioned<Trade>>,
    pub events: BTreeMap<(GameId, EventId), Versioned<GameEvent>>,
    pub leaderboards: BTreeMap<String, Versioned<SeasonLeaderboard>>,

    next_version: u64,
    next_seq: u64,
}

impl Shelf {
    // ── Queries ─────────────────────────────────────────────────────

    /// Resting open orders of one side, best price first, then arrival
    ///
    /// Best-first means ascending price for resting sells and descending
    /// for resting bids, so a matching scan can stop at the first
    /// non-crossing candidate.
    pub fn open_orders(
        &self,
        game: &GameId,
        market: &MarketId,
        side: Side,
        limit: usize,
    ) -> Vec<(OrderId, u64, Order)> {
        let mut hits: Vec<(OrderId, &Versioned<Order>)> = self
            .orders
            .iter()
            .filter(|((g, m, _), v)| {
                g == game
                    && m == market
                    && v.value.side == side
                    && v.value.status == OrderStatus::Open
            })
            .map(|((_, _, id), v)| (*id, v))
            .collect();

        hits.sort_by(|a, b| {
            let by_price = match side {
                Side::Sell => a.1.value.price.cmp(&b.1.value.price),
                Side::Buy => b.1.value.price.cmp(&a.1.value.price),
            };
            by_price.then(a.1.seq.cmp(&b.1.seq))
        });

        hits.into_iter()
            .take(limit)
            .map(|(id, v)| (id, v.version, v.value.clone()))
            .collect()
    }

    /// Exact-name team lookup (names are unique within a game)
    pub fn team_by_name(&self, game: &GameId, name: &str) -> Option<(TeamId, u64, Team)> {
        self.teams
            .iter()
            .find(|((g, _), v)| g == game && v.value.name == name)
            .map(|((_, id), v)| (*id, v.version, v.value.clone()))
    }

    // ── Validation ──────────────────────────────────────────────────

    /// Does the recorded read still describe the current shelf?
    pub fn still_valid(&self, read: &ReadCheck) -> bool {
        match read {
            ReadCheck::Game(id, ver) => self.games.get(id).map(|v| v.version) == *ver,
            ReadCheck::User(id, ver) => self.users.get(id).map(|v| v.version) == *ver,
            ReadCheck::Team(g, t, ver) => {
                self.teams.get(&(g.clone(), *t)).map(|v| v.version) == *ver
            }
            ReadCheck::Player(g, t, u, ver) => {
                self.players
                    .get(&(g.clone(), *t, u.clone()))
                    .map(|v| v.version)
                    == *ver
            }
            ReadCheck::Market(g, m, ver) => {
                self.markets.get(&(g.clone(), m.clone())).map(|v| v.version) == *ver
            }
            ReadCheck::Order(g, m, o, ver) => {
                self.orders
                    .get(&(g.clone(), m.clone(), *o))
                    .map(|v| v.version)
                    == *ver
            }
            ReadCheck::Leaderboard(season, ver) => {
                self.leaderboards.get(season).map(|v| v.version) == *ver
            }
            ReadCheck::OpenOrders {
                game,
                market,
                side,
                limit,
                fingerprint,
            } => {
                let current: Vec<(OrderId, u64)> = self
                    .open_orders(game, market, *side, *limit)
                    .into_iter()
                    .map(|(id, ver, _)| (id, ver))
                    .collect();
                current == *fingerprint
            }
            ReadCheck::TeamByName { game, name, found } => {
                self.team_by_name(game, name).map(|(id, ver, _)| (id, ver)) == *found
            }
        }
    }

    // ── Application ─────────────────────────────────────────────────

    /// Apply a commit's writes atomically under the exclusive lock
    pub fn apply(&mut self, writes: Vec<WriteOp>) -> u64 {
        self.next_version += 1;
        let commit = self.next_version;

        for op in writes {
            match op {
                WriteOp::PutGame(id, game) => {
                    put(&mut self.games, id, game, commit, &mut self.next_seq)
                }
                WriteOp::PutUser(id, user) => {
                    put(&mut self.users, id, user, commit, &mut self.next_seq)
                }
                WriteOp::PutTeam(g, t, team) => {
                    put(&mut self.teams, (g, t), team, commit, &mut self.next_seq)
                }
                WriteOp::PutPlayer(g, t, u, player) => {
                    put(&mut self.players, (g, t, u), player, commit, &mut self.next_seq)
                }
                WriteOp::DeletePlayer(g, t, u) => {
                    self.players.remove(&(g, t, u));
                }
                WriteOp::PutMarket(g, m, market) => {
                    put(&mut self.markets, (g, m), market, commit, &mut self.next_seq)
                }
                WriteOp::PutOrder(g, m, o, order) => {
                    put(&mut self.orders, (g, m, o), order, commit, &mut self.next_seq)
                }
                WriteOp::PutTrade(g, m, t, trade) => {
                    put(&mut self.trades, (g, m, t), trade, commit, &mut self.next_seq)
                }
                WriteOp::PutEvent(g, e, event) => {
                    put(&mut self.events, (g, e), event, commit, &mut self.next_seq)
                }
                WriteOp::PutLeaderboard(season, board) => {
                    put(&mut self.leaderboards, season, board, commit, &mut self.next_seq)
                }
            }
        }
        commit
    }
}

fn put<K: Ord, V>(
    map: &mut BTreeMap<K, Versioned<V>>,
    key: K,
    value: V,
    commit: u64,
    next_seq: &mut u64,
) {
    match map.entry(key) {
        Entry::Occupied(mut slot) => {
            let held = slot.get_mut();
            held.value = value;
            held.version = commit;
        }
        Entry::Vacant(slot) => {
            let seq = *next_seq;
            *next_seq += 1;
            slot.insert(Versioned {
                value,
                version: commit,
                seq,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use types::numeric::{Price, Shares};

    fn order(side: Side, price: u64, shares: u32) -> Order {
        Order::new(
            OrderId::new(),
            UserId::new("u-1"),
            TeamId::new(),
            side,
            Price::from_u64(price),
            Shares::new(shares),
            Utc::now(),
        )
    }

    fn shelf_with_sells(prices: &[u64]) -> (Shelf, GameId, MarketId) {
        let mut shelf = Shelf::default();
        let game = GameId::generate("dice");
        let market = MarketId::new("SUM");
        for &p in prices {
            let o = order(Side::Sell, p, 5);
            shelf.apply(vec![WriteOp::PutOrder(
                game.clone(),
                market.clone(),
                o.id,
                o,
            )]);
        }
        (shelf, game, market)
    }

    #[test]
    fn test_open_orders_sells_ascending() {
        let (shelf, game, market) = shelf_with_sells(&[12, 8, 10]);
        let batch = shelf.open_orders(&game, &market, Side::Sell, 10);
        let prices: Vec<Decimal> = batch.iter().map(|(_, _, o)| o.price.as_decimal()).collect();
        assert_eq!(prices, vec![dec!(8), dec!(10), dec!(12)]);
    }

    #[test]
    fn test_open_orders_bids_descending() {
        let mut shelf = Shelf::default();
        let game = GameId::generate("dice");
        let market = MarketId::new("SUM");
        for p in [7u64, 11, 9] {
            let o = order(Side::Buy, p, 5);
            shelf.apply(vec![WriteOp::PutOrder(
                game.clone(),
                market.clone(),
                o.id,
                o,
            )]);
        }
        let batch = shelf.open_orders(&game, &market, Side::Buy, 10);
        let prices: Vec<Decimal> = batch.iter().map(|(_, _, o)| o.price.as_decimal()).collect();
        assert_eq!(prices, vec![dec!(11), dec!(9), dec!(7)]);
    }

    #[test]
    fn test_equal_prices_tie_break_by_arrival() {
        let (shelf, game, market) = shelf_with_sells(&[10, 10, 10]);
        let batch = shelf.open_orders(&game, &market, Side::Sell, 10);
        let seqs: Vec<u64> = batch
            .iter()
            .map(|(id, _, _)| {
                shelf
                    .orders
                    .get(&(game.clone(), market.clone(), *id))
                    .map(|v| v.seq)
                    .unwrap()
            })
            .collect();
        let mut sorted = seqs.clone();
        sorted.sort_unstable();
        assert_eq!(seqs, sorted, "equal prices must come out in arrival order");
    }

    #[test]
    fn test_open_orders_respects_limit_and_status() {
        let (mut shelf, game, market) = shelf_with_sells(&[8, 9, 10, 11]);

        // Cancel the best one; it must drop out of the batch
        let best = shelf.open_orders(&game, &market, Side::Sell, 1)[0].clone();
        let mut cancelled = best.2.clone();
        cancelled.cancel(Utc::now());
        shelf.apply(vec![WriteOp::PutOrder(
            game.clone(),
            market.clone(),
            best.0,
            cancelled,
        )]);

        let batch = shelf.open_orders(&game, &market, Side::Sell, 2);
        assert_eq!(batch.len(), 2);
        let prices: Vec<Decimal> = batch.iter().map(|(_, _, o)| o.price.as_decimal()).collect();
        assert_eq!(prices, vec![dec!(9), dec!(10)]);
    }

    #[test]
    fn test_rewrite_keeps_arrival_seq() {
        let (mut shelf, game, market) = shelf_with_sells(&[10]);
        let (id, _, mut o) = shelf.open_orders(&game, &market, Side::Sell, 1)[0].clone();
        let seq_before = shelf.orders[&(game.clone(), market.clone(), id)].seq;

        o.apply_fill(Shares::new(2), Utc::now());
        shelf.apply(vec![WriteOp::PutOrder(game.clone(), market.clone(), id, o)]);

        let held = &shelf.orders[&(game.clone(), market.clone(), id)];
        assert_eq!(held.seq, seq_before, "updates must not change arrival order");
        assert_eq!(held.value.shares_remaining, Shares::new(3));
    }

    #[test]
    fn test_still_valid_detects_phantoms() {
        let (mut shelf, game, market) = shelf_with_sells(&[10]);
        let fingerprint: Vec<(OrderId, u64)> = shelf
            .open_orders(&game, &market, Side::Sell, 50)
            .into_iter()
            .map(|(id, ver, _)| (id, ver))
            .collect();
        let check = ReadCheck::OpenOrders {
            game: game.clone(),
            market: market.clone(),
            side: Side::Sell,
            limit: 50,
            fingerprint,
        };
        assert!(shelf.still_valid(&check));

        // A new resting order is a phantom for the recorded query
        let o = order(Side::Sell, 9, 1);
        shelf.apply(vec![WriteOp::PutOrder(game.clone(), market.clone(), o.id, o)]);
        assert!(!shelf.still_valid(&check));
    }

    #[test]
    fn test_still_valid_absent_reads() {
        let shelf = Shelf::default();
        let id = GameId::generate("dice");
        assert!(shelf.still_valid(&ReadCheck::Game(id.clone(), None)));
        assert!(!shelf.still_valid(&ReadCheck::Game(id, Some(1))));
    }
}
