//! Two-phase game settlement
//!
//! Settlement scans an unbounded number of trades, so it cannot run inside
//! one store transaction. Phase 1 is a short fencing transaction that flips
//! the game to `closing` and plants a `running` settlement marker; at most
//! one caller gets past it. Phase 2 does the bulk work outside any
//! transaction, safe because the fence holds off every other writer that
//! could touch the involved documents. Phase 3 marks the game `closed`, and
//! official games then merge into their season leaderboard in a final
//! transaction gated by the one-way `global_applied` flag.

use crate::pnl::PnlLedger;
use rules::rules_for;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use store::MemoryStore;
use types::auth::Caller;
use types::errors::ServiceError;
use types::game::{GameStatus, SettlementMarker};
use types::ids::{GameId, MarketId, SettlementId};
use types::leaderboard::{GameLeaderboard, GameLeaderboardEntry, PlayerStanding};

/// Result of a `close_game` call
#[derive(Debug, Clone, PartialEq)]
pub enum CloseOutcome {
    /// This call performed the settlement
    Closed {
        final_prices: BTreeMap<MarketId, Decimal>,
        leaderboard: GameLeaderboard,
    },
    /// The game was already settled; carries the stored final prices
    AlreadyClosed {
        final_prices: BTreeMap<MarketId, Decimal>,
    },
}

impl CloseOutcome {
    pub fn final_prices(&self) -> &BTreeMap<MarketId, Decimal> {
        match self {
            CloseOutcome::Closed { final_prices, .. } => final_prices,
            CloseOutcome::AlreadyClosed { final_prices } => final_prices,
        }
    }
}

enum Fence {
    Acquired,
    AlreadyFinished,
}

#[derive(Debug)]
pub struct SettlementEngine {
    store: Arc<MemoryStore>,
}

impl SettlementEngine {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Settle the caller's current game
    ///
    /// Callable by any current member. Idempotent: a second call returns
    /// [`CloseOutcome::AlreadyClosed`] without touching any balance.
    pub fn close_game(&self, caller: &Caller) -> Result<CloseOutcome, ServiceError> {
        let uid = caller.require()?.clone();
        let cg = self
            .store
            .get_user(&uid)
            .and_then(|user| user.current_game)
            .ok_or_else(|| ServiceError::failed_precondition("user not in a game"))?;
        let game_id = cg.game_id;

        // ── Phase 1: fence ──────────────────────────────────────────
        let fence = self.store.run_transaction(|tx| {
            let mut game = tx
                .get_game(&game_id)?
                .ok_or_else(|| ServiceError::not_found("game"))?;
            if game.settlement_finished() {
                return Ok(Fence::AlreadyFinished);
            }
            if game.settlement_running() {
                return Err(ServiceError::failed_precondition(
                    "settlement already running",
                ));
            }
            if game.status != GameStatus::Active {
                return Err(ServiceError::failed_precondition("game not active"));
            }
            let now = tx.now();
            game.status = GameStatus::Closing;
            game.settlement = Some(SettlementMarker::running(SettlementId::new(), now));
            tx.put_game(game);
            Ok(Fence::Acquired)
        })?;

        if let Fence::AlreadyFinished = fence {
            return Ok(CloseOutcome::AlreadyClosed {
                final_prices: self.stored_final_prices(&game_id),
            });
        }

        // ── Phase 2: bulk settlement under the fence ────────────────
        // The roll sequence is frozen now that the game left `active`,
        // and no new orders or trades can appear.
        let game = self
            .store
            .get_game(&game_id)
            .ok_or_else(|| ServiceError::internal("game vanished during settlement"))?;
        let final_prices = rules_for(game.kind).finalize(&game.rolls);

        let mut batch = self.store.batch();
        for mut market in self.store.list_markets(&game_id) {
            market.final_price = final_prices.get(&market.id).copied();
            batch.put_market(&game_id, market);
        }
        batch.commit();

        let mut ledger = PnlLedger::new();
        for (market_id, final_price) in &final_prices {
            for trade in self.store.list_trades(&game_id, market_id) {
                ledger.apply_trade(&trade, *final_price);
            }
        }

        let leaderboard = self.distribute(&game_id, &ledger);

        // ── Phase 3: finalize ───────────────────────────────────────
        self.store.run_transaction(|tx| {
            let mut game = tx
                .get_game(&game_id)?
                .ok_or_else(|| ServiceError::internal("game vanished during settlement"))?;
            let now = tx.now();
            game.status = GameStatus::Closed;
            game.closed_at = Some(now);
            if let Some(marker) = game.settlement.as_mut() {
                marker.finish(now);
            }
            tx.put_game(game);
            Ok(())
        })?;

        if game.is_official() {
            self.merge_into_season(&game_id)?;
        }

        tracing::info!(game = %game_id, markets = final_prices.len(), "game settled");
        Ok(CloseOutcome::Closed {
            final_prices,
            leaderboard,
        })
    }

    /// Write pnl onto teams, memberships, and user balances, and build the
    /// per-game leaderboard
    ///
    /// One atomic batch; every roster member appears on the board whether
    /// they traded or not. Blind user read-modify-write is safe here because
    /// members are pinned to this game until it closes.
    fn distribute(&self, game_id: &GameId, ledger: &PnlLedger) -> GameLeaderboard {
        let mut batch = self.store.batch();
        let mut leaderboard = GameLeaderboard::default();

        for mut team in self.store.list_teams(game_id) {
            let mut players = Vec::new();
            for mut member in self.store.list_players(game_id, &team.id) {
                let pnl = ledger.player(&team.id, &member.uid);
                member.pnl = pnl;
                players.push(PlayerStanding {
                    uid: member.uid.clone(),
                    email: member.email.clone(),
                    balance: pnl,
                });
                batch.put_player(game_id, &team.id, member);
            }
            team.balance = ledger.team(&team.id);
            leaderboard.teams.push(GameLeaderboardEntry {
                team_id: team.id,
                name: team.name.clone(),
                balance: team.balance,
                players,
            });
            batch.put_team(game_id, team);
        }

        for (uid, pnl) in ledger.users() {
            let mut user = self.store.get_user(uid).unwrap_or_default();
            user.balance += pnl;
            batch.put_user(uid.clone(), user);
        }

        batch.commit();
        leaderboard
    }

    /// Merge a settled official game into its season leaderboard
    ///
    /// Reads the `global_applied` flag and the board in one transaction and
    /// flips the flag alongside the merged board, so re-invocation after any
    /// retry changes the season totals exactly once.
    fn merge_into_season(&self, game_id: &GameId) -> Result<(), ServiceError> {
        // Settled rosters are immutable once the game leaves `active`;
        // snapshot them outside the merge transaction.
        let rosters: Vec<_> = self
            .store
            .list_teams(game_id)
            .into_iter()
            .map(|team| {
                let members = self.store.list_players(game_id, &team.id);
                (team, members)
            })
            .collect();

        self.store.run_transaction(|tx| {
            let mut game = tx
                .get_game(game_id)?
                .ok_or_else(|| ServiceError::internal("game vanished during settlement"))?;
            if game.global_applied() {
                return Ok(());
            }
            let season = game
                .season
                .clone()
                .ok_or_else(|| ServiceError::internal("official game missing season"))?;

            let mut board = tx.get_leaderboard(&season)?.unwrap_or_default();
            for (team, members) in &rosters {
                board.add_team(&team.name, team.balance);
                for member in members {
                    board.add_player(&member.uid, member.email.as_deref(), member.pnl);
                }
            }

            if let Some(marker) = game.settlement.as_mut() {
                marker.global_applied = true;
            }
            tx.put_game(game);
            tx.put_leaderboard(&season, board);
            tracing::info!(game = %game_id, season = %season, "merged into season leaderboard");
            Ok(())
        })
    }

    fn stored_final_prices(&self, game_id: &GameId) -> BTreeMap<MarketId, Decimal> {
        self.store
            .list_markets(game_id)
            .into_iter()
            .filter_map(|market| market.final_price.map(|price| (market.id, price)))
            .collect()
    }
}
