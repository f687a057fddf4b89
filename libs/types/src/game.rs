//! Game document and lifecycle state types
//!
//! The status field drives everything: `waiting` (roster open) → `active`
//! (trading and ticking) → `closing` (settlement running) → `closed`
//! (terminal). The embedded settlement marker is the fencing record that
//! serializes concurrent close attempts and carries the one-way
//! `global_applied` flag for the season leaderboard merge.

use crate::ids::{GameId, SettlementId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which rule set the game runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Dice,
    Cards,
}

impl GameKind {
    /// Parse a wire-format kind string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "dice" => Some(GameKind::Dice),
            "cards" => Some(GameKind::Cards),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::Dice => "dice",
            GameKind::Cards => "cards",
        }
    }
}

/// Whether settlement feeds the cross-game season leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Official,
    Unofficial,
}

impl Visibility {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "official" => Some(Visibility::Official),
            "unofficial" => Some(Visibility::Unofficial),
            _ => None,
        }
    }

    pub fn is_official(&self) -> bool {
        matches!(self, Visibility::Official)
    }
}

/// Lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Waiting,
    Active,
    Closing,
    Closed,
}

/// Settlement attempt state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementState {
    Running,
    Finished,
}

/// Fencing record written by the settlement engine
///
/// Created by the Phase 1 transaction (`Running`), completed by Phase 3
/// (`Finished`). `global_applied` flips true at most once, inside the same
/// transaction that merges this game into its season leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementMarker {
    pub state: SettlementState,
    pub id: SettlementId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub global_applied: bool,
}

impl SettlementMarker {
    /// Start a fresh attempt
    pub fn running(id: SettlementId, now: DateTime<Utc>) -> Self {
        Self {
            state: SettlementState::Running,
            id,
            started_at: now,
            finished_at: None,
            global_applied: false,
        }
    }

    pub fn finish(&mut self, now: DateTime<Utc>) {
        self.state = SettlementState::Finished;
        self.finished_at = Some(now);
    }
}

/// The game document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub kind: GameKind,
    pub visibility: Visibility,
    pub season: Option<String>,
    pub status: GameStatus,

    /// Append-only event feed outcomes (dice rolls or drawn cards)
    pub rolls: Vec<i64>,

    pub settlement: Option<SettlementMarker>,

    pub created_at: DateTime<Utc>,
    pub start_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Game {
    /// Create a game in `waiting` with an empty event feed
    pub fn new(
        id: GameId,
        kind: GameKind,
        visibility: Visibility,
        season: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            visibility,
            season,
            status: GameStatus::Waiting,
            rolls: Vec::new(),
            settlement: None,
            created_at: now,
            start_at: None,
            closed_at: None,
        }
    }

    pub fn is_official(&self) -> bool {
        self.visibility.is_official()
    }

    pub fn settlement_running(&self) -> bool {
        matches!(
            &self.settlement,
            Some(m) if m.state == SettlementState::Running
        )
    }

    pub fn settlement_finished(&self) -> bool {
        self.status == GameStatus::Closed
            || matches!(
                &self.settlement,
                Some(m) if m.state == SettlementState::Finished
            )
    }

    pub fn global_applied(&self) -> bool {
        matches!(&self.settlement, Some(m) if m.global_applied)
    }
}
