//! Game-type rules
//!
//! Each game kind plugs in one [`GameRules`] implementation describing its
//! market symbols, how one event tick mutates the roll sequence, and how the
//! accumulated sequence turns into final prices at settlement. The engines
//! never inspect the kind themselves; they go through [`rules_for`].
//!
//! `finalize` is a pure function of the roll sequence. `tick` takes a
//! caller-supplied RNG so games replay deterministically under a fixed seed.

use rand::RngCore;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::events::GameEventKind;
use types::game::GameKind;
use types::ids::MarketId;

pub mod cards;
pub mod dice;

pub use cards::CardsRules;
pub use dice::DiceRules;

/// One market a game kind defines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketDef {
    pub symbol: &'static str,
    pub name: &'static str,
}

impl MarketDef {
    pub fn market_id(&self) -> MarketId {
        MarketId::new(self.symbol)
    }
}

/// The result of one event tick
///
/// `roll` is appended to the game's sequence by the caller when present;
/// a terminal tick (exhausted deck) carries an event but no roll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub roll: Option<i64>,
    pub event: GameEventKind,
}

/// Event generator and valuation formulas for one game kind
pub trait GameRules: Send + Sync {
    fn kind(&self) -> GameKind;

    /// The fixed market set, in creation order
    fn markets(&self) -> &'static [MarketDef];

    /// Produce the next event given the rolls so far
    fn tick(&self, rolls: &[i64], rng: &mut dyn RngCore) -> TickOutcome;

    /// Final price per market, a pure function of the roll sequence
    fn finalize(&self, rolls: &[i64]) -> BTreeMap<MarketId, Decimal>;
}

static DICE: DiceRules = DiceRules;
static CARDS: CardsRules = CardsRules;

/// Look up the rules for a game kind
pub fn rules_for(kind: GameKind) -> &'static dyn GameRules {
    match kind {
        GameKind::Dice => &DICE,
        GameKind::Cards => &CARDS,
    }
}
