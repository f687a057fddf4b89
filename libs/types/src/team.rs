//! Team and roster membership documents

use crate::ids::{TeamId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A team within one game
///
/// Created lazily the first time someone joins under its name; the name is
/// matched case-sensitively and is unique within the game. `balance` stays
/// zero until settlement writes the game's aggregate pnl into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub balance: Decimal,
}

impl Team {
    pub fn new(id: TeamId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            balance: Decimal::ZERO,
        }
    }
}

/// Roster membership of one user on one team
///
/// Existence implies membership; leaving deletes the record. `pnl` stays
/// zero until settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMembership {
    pub uid: UserId,
    pub email: Option<String>,
    pub pnl: Decimal,
    pub joined_at: DateTime<Utc>,
}

impl PlayerMembership {
    pub fn new(uid: UserId, email: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            uid,
            email,
            pnl: Decimal::ZERO,
            joined_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_team_starts_flat() {
        let team = Team::new(TeamId::new(), "Alpha");
        assert_eq!(team.name, "Alpha");
        assert_eq!(team.balance, Decimal::ZERO);
    }

    #[test]
    fn test_membership_carries_email() {
        let m = PlayerMembership::new(
            UserId::new("u-1"),
            Some("u1@example.com".to_string()),
            Utc::now(),
        );
        assert_eq!(m.email.as_deref(), Some("u1@example.com"));
        assert_eq!(m.pnl, Decimal::ZERO);
    }
}
