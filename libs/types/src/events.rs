//! Game event log entries
//!
//! Every lifecycle operation that changes what spectators would care about
//! appends one of these to the game's event feed. The feed is append-only
//! and never read back by the engines themselves.

use crate::ids::{EventId, TeamId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEventKind {
    PlayerJoined { uid: UserId, team_name: String },
    PlayerLeft { uid: UserId, team_id: TeamId },
    GameStarted { uid: UserId },
    DiceRoll { roll: i64 },
    CardDrawn { card: i64 },
    DeckExhausted,
}

impl GameEventKind {
    /// Short label for log lines
    pub fn label(&self) -> &'static str {
        match self {
            GameEventKind::PlayerJoined { .. } => "player_joined",
            GameEventKind::PlayerLeft { .. } => "player_left",
            GameEventKind::GameStarted { .. } => "game_started",
            GameEventKind::DiceRoll { .. } => "dice_roll",
            GameEventKind::CardDrawn { .. } => "card_drawn",
            GameEventKind::DeckExhausted => "deck_exhausted",
        }
    }

    /// True for events that end the game's event feed
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEventKind::DeckExhausted)
    }
}

/// One entry in a game's event feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: EventId,
    #[serde(flatten)]
    pub kind: GameEventKind,
    pub created_at: DateTime<Utc>,
}

impl GameEvent {
    pub fn new(id: EventId, kind: GameEventKind, now: DateTime<Utc>) -> Self {
        Self {
            id,
            kind,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_tagging() {
        let kind = GameEventKind::DiceRoll { roll: 17 };
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"dice_roll\""));
        assert!(json.contains("\"roll\":17"));

        let back: GameEventKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, back);
    }

    #[test]
    fn test_event_labels() {
        assert_eq!(
            GameEventKind::PlayerJoined {
                uid: UserId::new("u-1"),
                team_name: "Alpha".to_string()
            }
            .label(),
            "player_joined"
        );
        assert_eq!(GameEventKind::DeckExhausted.label(), "deck_exhausted");
    }

    #[test]
    fn test_only_deck_exhausted_is_terminal() {
        assert!(GameEventKind::DeckExhausted.is_terminal());
        assert!(!GameEventKind::DiceRoll { roll: 1 }.is_terminal());
        assert!(!GameEventKind::CardDrawn { card: 4 }.is_terminal());
    }

    #[test]
    fn test_event_roundtrip_with_flattened_kind() {
        let event = GameEvent::new(
            EventId::new(),
            GameEventKind::CardDrawn { card: 9 },
            Utc::now(),
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"card_drawn\""));

        let back: GameEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
