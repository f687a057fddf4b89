//! Dice game rules
//!
//! Each tick rolls one uniform integer in `[1, 30]`. Final prices are
//! aggregate statistics of the roll sequence; a game with no rolls settles
//! every market at zero.

use crate::{GameRules, MarketDef, TickOutcome};
use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::events::GameEventKind;
use types::game::GameKind;
use types::ids::MarketId;

const MARKETS: [MarketDef; 5] = [
    MarketDef {
        symbol: "SUM",
        name: "SUM",
    },
    MarketDef {
        symbol: "PRODUCT",
        name: "PRODUCT",
    },
    MarketDef {
        symbol: "RANGE",
        name: "RANGE",
    },
    MarketDef {
        symbol: "EVENS",
        name: "EVENS",
    },
    MarketDef {
        symbol: "ODDS",
        name: "ODDS",
    },
];

const ROLL_MIN: i64 = 1;
const ROLL_MAX: i64 = 30;

#[derive(Debug, Clone, Copy, Default)]
pub struct DiceRules;

impl GameRules for DiceRules {
    fn kind(&self) -> GameKind {
        GameKind::Dice
    }

    fn markets(&self) -> &'static [MarketDef] {
        &MARKETS
    }

    fn tick(&self, _rolls: &[i64], rng: &mut dyn RngCore) -> TickOutcome {
        let roll = rng.gen_range(ROLL_MIN..=ROLL_MAX);
        TickOutcome {
            roll: Some(roll),
            event: GameEventKind::DiceRoll { roll },
        }
    }

    fn finalize(&self, rolls: &[i64]) -> BTreeMap<MarketId, Decimal> {
        let mut prices = BTreeMap::new();
        if rolls.is_empty() {
            for def in MARKETS.iter() {
                prices.insert(def.market_id(), Decimal::ZERO);
            }
            return prices;
        }

        let sum: i64 = rolls.iter().sum();
        let max = rolls.iter().max().copied().unwrap_or(0);
        let min = rolls.iter().min().copied().unwrap_or(0);
        let range = max - min;
        let sum_evens: i64 = rolls.iter().filter(|x| *x % 2 == 0).sum();
        let sum_odds: i64 = rolls.iter().filter(|x| *x % 2 == 1).sum();

        // Long games overflow the product; saturate rather than panic.
        let product = rolls
            .iter()
            .try_fold(Decimal::ONE, |acc, &r| acc.checked_mul(Decimal::from(r)))
            .unwrap_or(Decimal::MAX);

        prices.insert(MarketId::new("SUM"), Decimal::from(sum));
        prices.insert(MarketId::new("PRODUCT"), product);
        prices.insert(MarketId::new("RANGE"), Decimal::from(range));
        prices.insert(MarketId::new("EVENS"), square(sum_evens));
        prices.insert(MarketId::new("ODDS"), square(sum_odds));
        prices
    }
}

fn square(n: i64) -> Decimal {
    let d = Decimal::from(n);
    d.checked_mul(d).unwrap_or(Decimal::MAX)
}
