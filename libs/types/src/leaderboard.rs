//! Leaderboard structures
//!
//! Two shapes: the per-game leaderboard returned by settlement (teams with
//! their rosters nested) and the season leaderboard document that official
//! games merge into, keyed by season string and accumulated monotonically.

use crate::ids::{TeamId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A team's standing on the season board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub name: String,
    pub balance: Decimal,
}

/// A player's standing on the season board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub uid: UserId,
    pub email: Option<String>,
    pub balance: Decimal,
}

/// Season-wide running totals across official games
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeasonLeaderboard {
    pub teams: Vec<TeamStanding>,
    pub players: Vec<PlayerStanding>,
}

impl SeasonLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a team's game result, matching by exact name
    pub fn add_team(&mut self, name: &str, delta: Decimal) {
        match self.teams.iter_mut().find(|t| t.name == name) {
            Some(team) => team.balance += delta,
            None => self.teams.push(TeamStanding {
                name: name.to_string(),
                balance: delta,
            }),
        }
    }

    /// Add a player's game result, matching by user identity
    ///
    /// A provided email refreshes a stale one; absence leaves the stored
    /// value alone.
    pub fn add_player(&mut self, uid: &UserId, email: Option<&str>, delta: Decimal) {
        match self.players.iter_mut().find(|p| &p.uid == uid) {
            Some(player) => {
                player.balance += delta;
                if let Some(email) = email {
                    player.email = Some(email.to_string());
                }
            }
            None => self.players.push(PlayerStanding {
                uid: uid.clone(),
                email: email.map(|e| e.to_string()),
                balance: delta,
            }),
        }
    }
}

/// One team's row on a settled game's leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLeaderboardEntry {
    pub team_id: TeamId,
    pub name: String,
    pub balance: Decimal,
    pub players: Vec<PlayerStanding>,
}

/// The settled result of one game: every roster team with every member
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameLeaderboard {
    pub teams: Vec<GameLeaderboardEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_add_team_creates_then_accumulates() {
        let mut board = SeasonLeaderboard::new();
        board.add_team("Alpha", dec!(10));
        board.add_team("Beta", dec!(-10));
        board.add_team("Alpha", dec!(5));

        assert_eq!(board.teams.len(), 2);
        assert_eq!(board.teams[0].balance, dec!(15));
        assert_eq!(board.teams[1].balance, dec!(-10));
    }

    #[test]
    fn test_team_names_match_case_sensitively() {
        let mut board = SeasonLeaderboard::new();
        board.add_team("alpha", dec!(1));
        board.add_team("Alpha", dec!(1));
        assert_eq!(board.teams.len(), 2);
    }

    #[test]
    fn test_add_player_refreshes_email() {
        let mut board = SeasonLeaderboard::new();
        let uid = UserId::new("u-1");
        board.add_player(&uid, None, dec!(3));
        assert!(board.players[0].email.is_none());

        board.add_player(&uid, Some("u1@example.com"), dec!(2));
        assert_eq!(board.players.len(), 1);
        assert_eq!(board.players[0].balance, dec!(5));
        assert_eq!(board.players[0].email.as_deref(), Some("u1@example.com"));

        // Absent email does not erase the stored one
        board.add_player(&uid, None, dec!(1));
        assert_eq!(board.players[0].email.as_deref(), Some("u1@example.com"));
    }
}
