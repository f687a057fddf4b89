//! Game lifecycle state machine
//!
//! Every transition is guarded inside one store transaction against the
//! status read in that same transaction, so two racing callers observe a
//! consistent precondition and one of them fails cleanly instead of
//! double-applying.

use chrono::Utc;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rules::rules_for;
use std::sync::{Arc, Mutex};
use store::MemoryStore;
use types::auth::Caller;
use types::errors::ServiceError;
use types::events::{GameEvent, GameEventKind};
use types::game::{Game, GameKind, GameStatus, Visibility};
use types::ids::{EventId, GameId, TeamId, UserId};
use types::market::Market;
use types::team::{PlayerMembership, Team};
use types::user::CurrentGame;

/// Game lifecycle controller
///
/// Owns the event RNG; everything else lives in the store.
#[derive(Debug)]
pub struct GameLifecycle {
    store: Arc<MemoryStore>,
    rng: Mutex<ChaCha8Rng>,
}

impl GameLifecycle {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self::with_seed(store, rand::thread_rng().next_u64())
    }

    /// Fixed-seed constructor for deterministic replays
    pub fn with_seed(store: Arc<MemoryStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    // ── Creation ────────────────────────────────────────────────────

    /// Create a game in `waiting` plus one market per rules symbol
    ///
    /// The game and its markets are written in one atomic batch; there is
    /// no observable state where the game exists without its markets.
    pub fn create_game(
        &self,
        caller: &Caller,
        kind: &str,
        season: Option<&str>,
        visibility: &str,
    ) -> Result<GameId, ServiceError> {
        caller.require()?;
        let kind = GameKind::parse(kind)
            .ok_or_else(|| ServiceError::invalid_argument("unknown game type"))?;
        let visibility = Visibility::parse(visibility)
            .ok_or_else(|| ServiceError::invalid_argument("invalid visibility"))?;
        let season = season
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        if visibility.is_official() && season.is_none() {
            return Err(ServiceError::invalid_argument(
                "official games require a season",
            ));
        }

        let rules = rules_for(kind);
        let game_id = GameId::generate(kind.as_str());
        let game = Game::new(game_id.clone(), kind, visibility, season, Utc::now());

        let mut batch = self.store.batch();
        batch.put_game(game);
        for def in rules.markets() {
            batch.put_market(&game_id, Market::new(def.market_id(), def.name));
        }
        batch.commit();

        tracing::info!(game = %game_id, kind = kind.as_str(), "game created");
        Ok(game_id)
    }

    // ── Roster ──────────────────────────────────────────────────────

    /// Join a waiting game under a team name, creating the team on first use
    ///
    /// Re-joining the same game with the same team is an idempotent no-op.
    /// A `current_game` pointer left behind by a finished game does not
    /// count as being in a game; joining simply overwrites it.
    pub fn join_game(
        &self,
        caller: &Caller,
        game_id: &GameId,
        team_name: &str,
        email: Option<&str>,
    ) -> Result<(), ServiceError> {
        let uid = caller.require()?.clone();
        if team_name.trim().is_empty() {
            return Err(ServiceError::invalid_argument("team name required"));
        }
        let email: Option<String> = email.map(String::from);

        self.store.run_transaction(|tx| {
            let game = tx
                .get_game(game_id)?
                .ok_or_else(|| ServiceError::not_found("game"))?;
            if game.status != GameStatus::Waiting {
                return Err(ServiceError::failed_precondition("game already started"));
            }

            let mut user = tx.get_user(&uid)?.unwrap_or_default();
            if let Some(cg) = &user.current_game {
                if cg.game_id == *game_id {
                    let team = tx.get_team(game_id, &cg.team_id)?;
                    if team.as_ref().map(|t| t.name.as_str()) == Some(team_name) {
                        return Ok(()); // already on this team
                    }
                    return Err(ServiceError::failed_precondition(
                        "already joined on another team",
                    ));
                }
                match tx.get_game(&cg.game_id)? {
                    Some(other) if !other.settlement_finished() => {
                        return Err(ServiceError::failed_precondition(
                            "user already in a game",
                        ));
                    }
                    // Pointer at a finished or vanished game is stale and
                    // gets overwritten below.
                    _ => {}
                }
            }

            let found = tx.team_by_name(game_id, team_name)?;
            let now = tx.now();

            let team_id = match found {
                Some(team) => team.id,
                None => {
                    let team = Team::new(TeamId::new(), team_name);
                    let id = team.id;
                    tx.put_team(game_id, team);
                    id
                }
            };

            let effective_email = user.email.clone().or_else(|| email.clone());
            tx.put_player(
                game_id,
                &team_id,
                PlayerMembership::new(uid.clone(), effective_email.clone(), now),
            );

            user.current_game = Some(CurrentGame {
                game_id: game_id.clone(),
                team_id,
            });
            user.email = effective_email;
            tx.put_user(uid.clone(), user);

            tx.put_event(
                game_id,
                GameEvent::new(
                    EventId::new(),
                    GameEventKind::PlayerJoined {
                        uid: uid.clone(),
                        team_name: team_name.to_string(),
                    },
                    now,
                ),
            );
            Ok(())
        })?;

        tracing::info!(game = %game_id, user = %uid, team = team_name, "player joined");
        Ok(())
    }

    /// Leave the current game; only allowed while the roster is open
    pub fn leave_game(&self, caller: &Caller) -> Result<(), ServiceError> {
        let uid = caller.require()?.clone();

        let game_id = self.store.run_transaction(|tx| {
            let mut user = tx
                .get_user(&uid)?
                .ok_or_else(|| ServiceError::not_found("user"))?;
            let cg = user
                .current_game
                .clone()
                .ok_or_else(|| ServiceError::failed_precondition("user not in a game"))?;

            let game = tx
                .get_game(&cg.game_id)?
                .ok_or_else(|| ServiceError::not_found("game"))?;
            if game.status != GameStatus::Waiting {
                return Err(ServiceError::failed_precondition(
                    "cannot leave after game starts",
                ));
            }

            let now = tx.now();
            tx.delete_player(&cg.game_id, &cg.team_id, &uid);
            user.current_game = None;
            tx.put_user(uid.clone(), user);
            tx.put_event(
                &cg.game_id,
                GameEvent::new(
                    EventId::new(),
                    GameEventKind::PlayerLeft {
                        uid: uid.clone(),
                        team_id: cg.team_id,
                    },
                    now,
                ),
            );
            Ok(cg.game_id)
        })?;

        tracing::info!(game = %game_id, user = %uid, "player left");
        Ok(())
    }

    // ── Progression ─────────────────────────────────────────────────

    /// Transition `waiting` to `active`, freezing the roster
    ///
    /// Any current member may start the game.
    pub fn start_game(&self, caller: &Caller) -> Result<(), ServiceError> {
        let uid = caller.require()?.clone();
        let cg = self.current_game(&uid)?;

        self.store.run_transaction(|tx| {
            let mut game = tx
                .get_game(&cg.game_id)?
                .ok_or_else(|| ServiceError::not_found("game"))?;
            if game.status != GameStatus::Waiting {
                return Err(ServiceError::failed_precondition(
                    "game not in waiting status",
                ));
            }

            let now = tx.now();
            game.status = GameStatus::Active;
            game.start_at = Some(now);
            tx.put_game(game);
            tx.put_event(
                &cg.game_id,
                GameEvent::new(
                    EventId::new(),
                    GameEventKind::GameStarted { uid: uid.clone() },
                    now,
                ),
            );
            Ok(())
        })?;

        tracing::info!(game = %cg.game_id, user = %uid, "game started");
        Ok(())
    }

    /// Advance the event feed by one tick
    ///
    /// Delegates to the game-kind rules, appends the produced roll (if any)
    /// to the sequence, and records the emitted event. Re-running the body
    /// on a store conflict redraws the tick; only the committed draw is
    /// ever observable.
    pub fn tick_game(&self, caller: &Caller) -> Result<GameEvent, ServiceError> {
        let uid = caller.require()?.clone();
        let cg = self.current_game(&uid)?;

        let event = self.store.run_transaction(|tx| {
            let mut game = tx
                .get_game(&cg.game_id)?
                .ok_or_else(|| ServiceError::not_found("game"))?;
            if game.status != GameStatus::Active {
                return Err(ServiceError::failed_precondition("game not active"));
            }

            let outcome = {
                let mut rng = self.rng.lock().expect("rng lock poisoned");
                rules_for(game.kind).tick(&game.rolls, &mut *rng)
            };

            let now = tx.now();
            if let Some(roll) = outcome.roll {
                game.rolls.push(roll);
            }
            tx.put_game(game);

            let event = GameEvent::new(EventId::new(), outcome.event, now);
            tx.put_event(&cg.game_id, event.clone());
            Ok(event)
        })?;

        tracing::debug!(game = %cg.game_id, kind = event.kind.label(), "tick");
        Ok(event)
    }

    /// Resolve the caller's current game pointer outside the transaction
    fn current_game(&self, uid: &UserId) -> Result<CurrentGame, ServiceError> {
        self.store
            .get_user(uid)
            .and_then(|user| user.current_game)
            .ok_or_else(|| ServiceError::failed_precondition("user not in a game"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::events::GameEventKind;

    fn setup() -> (Arc<MemoryStore>, GameLifecycle) {
        let store = Arc::new(MemoryStore::default());
        let lifecycle = GameLifecycle::with_seed(Arc::clone(&store), 7);
        (store, lifecycle)
    }

    fn caller(name: &str) -> Caller {
        Caller::authenticated(name)
    }

    #[test]
    fn test_create_game_allocates_markets() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();

        let game = store.get_game(&id).unwrap();
        assert_eq!(game.status, GameStatus::Waiting);
        assert_eq!(game.kind, GameKind::Dice);
        assert!(game.rolls.is_empty());
        assert!(id.as_str().starts_with("dice-"));

        let symbols: Vec<String> = store
            .list_markets(&id)
            .into_iter()
            .map(|m| m.id.as_str().to_string())
            .collect();
        assert_eq!(symbols, vec!["SUM", "PRODUCT", "RANGE", "EVENS", "ODDS"]);
    }

    #[test]
    fn test_create_game_validation() {
        let (_, lifecycle) = setup();

        let err = lifecycle
            .create_game(&Caller::anonymous(), "dice", None, "unofficial")
            .unwrap_err();
        assert_eq!(err.code(), "unauthenticated");

        let err = lifecycle
            .create_game(&caller("a"), "roulette", None, "unofficial")
            .unwrap_err();
        assert_eq!(err.code(), "invalid-argument");

        let err = lifecycle
            .create_game(&caller("a"), "dice", None, "official")
            .unwrap_err();
        assert_eq!(err.code(), "invalid-argument");

        let err = lifecycle
            .create_game(&caller("a"), "dice", Some("  "), "official")
            .unwrap_err();
        assert_eq!(err.code(), "invalid-argument");

        lifecycle
            .create_game(&caller("a"), "dice", Some("season-1"), "official")
            .unwrap();
    }

    #[test]
    fn test_join_creates_team_then_reuses_it() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();

        lifecycle
            .join_game(&caller("a"), &id, "reds", Some("a@x.io"))
            .unwrap();
        lifecycle.join_game(&caller("b"), &id, "reds", None).unwrap();
        lifecycle.join_game(&caller("c"), &id, "blues", None).unwrap();

        let teams = store.list_teams(&id);
        assert_eq!(teams.len(), 2);
        assert_eq!(teams[0].name, "reds");
        assert_eq!(store.list_players(&id, &teams[0].id).len(), 2);
        assert_eq!(store.list_players(&id, &teams[1].id).len(), 1);

        let user = store.get_user(&UserId::new("a")).unwrap();
        let cg = user.current_game.unwrap();
        assert_eq!(cg.game_id, id);
        assert_eq!(cg.team_id, teams[0].id);
        assert_eq!(user.email.as_deref(), Some("a@x.io"));
    }

    #[test]
    fn test_team_names_are_case_sensitive() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();

        lifecycle.join_game(&caller("a"), &id, "Reds", None).unwrap();
        lifecycle.join_game(&caller("b"), &id, "reds", None).unwrap();

        assert_eq!(store.list_teams(&id).len(), 2);
    }

    #[test]
    fn test_rejoin_same_team_is_idempotent() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();

        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();
        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();

        let teams = store.list_teams(&id);
        assert_eq!(teams.len(), 1);
        assert_eq!(store.list_players(&id, &teams[0].id).len(), 1);

        let err = lifecycle
            .join_game(&caller("a"), &id, "blues", None)
            .unwrap_err();
        assert_eq!(err.code(), "failed-precondition");
    }

    #[test]
    fn test_join_blocked_while_in_live_game() {
        let (_, lifecycle) = setup();
        let first = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();
        let second = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();

        lifecycle
            .join_game(&caller("a"), &first, "reds", None)
            .unwrap();
        let err = lifecycle
            .join_game(&caller("a"), &second, "reds", None)
            .unwrap_err();
        assert_eq!(err.code(), "failed-precondition");
    }

    #[test]
    fn test_stale_pointer_does_not_block_joining() {
        let (store, lifecycle) = setup();
        let first = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();
        lifecycle
            .join_game(&caller("a"), &first, "reds", None)
            .unwrap();

        // Finish the first game out from under the pointer.
        let mut game = store.get_game(&first).unwrap();
        game.status = GameStatus::Closed;
        let mut batch = store.batch();
        batch.put_game(game);
        batch.commit();

        let second = lifecycle
            .create_game(&caller("b"), "dice", None, "unofficial")
            .unwrap();
        lifecycle
            .join_game(&caller("a"), &second, "blues", None)
            .unwrap();

        let cg = store
            .get_user(&UserId::new("a"))
            .unwrap()
            .current_game
            .unwrap();
        assert_eq!(cg.game_id, second);
    }

    #[test]
    fn test_join_requires_waiting_game() {
        let (_, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();
        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();
        lifecycle.start_game(&caller("a")).unwrap();

        let err = lifecycle
            .join_game(&caller("b"), &id, "reds", None)
            .unwrap_err();
        assert_eq!(err.code(), "failed-precondition");
    }

    #[test]
    fn test_leave_only_while_waiting() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();
        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();
        lifecycle.join_game(&caller("b"), &id, "reds", None).unwrap();

        lifecycle.leave_game(&caller("b")).unwrap();
        let user = store.get_user(&UserId::new("b")).unwrap();
        assert!(user.current_game.is_none());
        let teams = store.list_teams(&id);
        assert_eq!(store.list_players(&id, &teams[0].id).len(), 1);

        lifecycle.start_game(&caller("a")).unwrap();
        let err = lifecycle.leave_game(&caller("a")).unwrap_err();
        assert_eq!(err.code(), "failed-precondition");
    }

    #[test]
    fn test_start_requires_membership_and_waiting() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();

        let err = lifecycle.start_game(&caller("a")).unwrap_err();
        assert_eq!(err.code(), "failed-precondition");

        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();
        lifecycle.start_game(&caller("a")).unwrap();

        let game = store.get_game(&id).unwrap();
        assert_eq!(game.status, GameStatus::Active);
        assert!(game.start_at.is_some());

        let err = lifecycle.start_game(&caller("a")).unwrap_err();
        assert_eq!(err.code(), "failed-precondition");
    }

    #[test]
    fn test_tick_appends_rolls_and_events() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "dice", None, "unofficial")
            .unwrap();
        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();

        let err = lifecycle.tick_game(&caller("a")).unwrap_err();
        assert_eq!(err.code(), "failed-precondition");

        lifecycle.start_game(&caller("a")).unwrap();
        for _ in 0..3 {
            let event = lifecycle.tick_game(&caller("a")).unwrap();
            assert!(matches!(event.kind, GameEventKind::DiceRoll { .. }));
        }

        let game = store.get_game(&id).unwrap();
        assert_eq!(game.rolls.len(), 3);
        for roll in &game.rolls {
            assert!((1..=30).contains(roll));
        }

        // join + start + 3 rolls
        assert_eq!(store.list_events(&id).len(), 5);
    }

    #[test]
    fn test_seeded_ticks_replay_identically() {
        let run = || {
            let (store, lifecycle) = setup();
            let id = lifecycle
                .create_game(&caller("a"), "dice", None, "unofficial")
                .unwrap();
            lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();
            lifecycle.start_game(&caller("a")).unwrap();
            for _ in 0..10 {
                lifecycle.tick_game(&caller("a")).unwrap();
            }
            store.get_game(&id).unwrap().rolls
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_cards_game_exhausts_deck() {
        let (store, lifecycle) = setup();
        let id = lifecycle
            .create_game(&caller("a"), "cards", None, "unofficial")
            .unwrap();
        lifecycle.join_game(&caller("a"), &id, "reds", None).unwrap();
        lifecycle.start_game(&caller("a")).unwrap();

        for _ in 0..10 {
            let event = lifecycle.tick_game(&caller("a")).unwrap();
            assert!(matches!(event.kind, GameEventKind::CardDrawn { .. }));
        }
        let event = lifecycle.tick_game(&caller("a")).unwrap();
        assert_eq!(event.kind, GameEventKind::DeckExhausted);

        let game = store.get_game(&id).unwrap();
        assert_eq!(game.rolls.len(), 10);
        let mut drawn = game.rolls.clone();
        drawn.sort_unstable();
        assert_eq!(drawn, (1..=10).collect::<Vec<i64>>());
        assert!(game.settlement.is_none());
    }
}
