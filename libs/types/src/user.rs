//! User documents
//!
//! Users exist across games; `current_game` pins a user to at most one
//! live game at a time and `balance` accumulates settled pnl forever.

use crate::ids::{GameId, TeamId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pointer from a user to the game and team they are playing in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentGame {
    pub game_id: GameId,
    pub team_id: TeamId,
}

/// The user document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    pub email: Option<String>,
    pub current_game: Option<CurrentGame>,
    pub balance: Decimal,
}

impl User {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_game(&self) -> bool {
        self.current_game.is_some()
    }
}
