//! Cards game rules
//!
//! The deck is the integers `[1, 10]`, drawn without replacement; the roll
//! sequence records the drawn cards in order. Once the deck is empty, ticks
//! emit the terminal deck-exhausted event and leave the sequence alone.
//!
//! Valuation is inverted relative to dice: every formula reads the *undrawn
//! complement*, so the market prices reflect what never came out of the deck.

use crate::{GameRules, MarketDef, TickOutcome};
use rand::{Rng, RngCore};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use types::events::GameEventKind;
use types::game::GameKind;
use types::ids::MarketId;

const MARKETS: [MarketDef; 5] = [
    MarketDef {
        symbol: "2s",
        name: "2s",
    },
    MarketDef {
        symbol: "3s",
        name: "3s",
    },
    MarketDef {
        symbol: "4s",
        name: "4s",
    },
    MarketDef {
        symbol: "5s",
        name: "5s",
    },
    MarketDef {
        symbol: "6s",
        name: "6s",
    },
];

const DECK: [i64; 10] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10];

#[derive(Debug, Clone, Copy, Default)]
pub struct CardsRules;

fn undrawn(rolls: &[i64]) -> Vec<i64> {
    DECK.iter().copied().filter(|c| !rolls.contains(c)).collect()
}

impl GameRules for CardsRules {
    fn kind(&self) -> GameKind {
        GameKind::Cards
    }

    fn markets(&self) -> &'static [MarketDef] {
        &MARKETS
    }

    fn tick(&self, rolls: &[i64], rng: &mut dyn RngCore) -> TickOutcome {
        let remaining = undrawn(rolls);
        if remaining.is_empty() {
            return TickOutcome {
                roll: None,
                event: GameEventKind::DeckExhausted,
            };
        }
        let card = remaining[rng.gen_range(0..remaining.len())];
        TickOutcome {
            roll: Some(card),
            event: GameEventKind::CardDrawn { card },
        }
    }

    fn finalize(&self, rolls: &[i64]) -> BTreeMap<MarketId, Decimal> {
        let remaining = undrawn(rolls);

        let sum_evens: i64 = remaining.iter().filter(|x| *x % 2 == 0).sum();
        let sum_mult3: i64 = remaining.iter().filter(|x| *x % 3 == 0).sum();
        let gt4: Vec<i64> = remaining.iter().copied().filter(|x| *x > 4).collect();
        let le5: Vec<i64> = remaining.iter().copied().filter(|x| *x <= 5).collect();
        let sum_6up: i64 = remaining.iter().filter(|x| **x >= 6).sum();

        let mut prices = BTreeMap::new();
        prices.insert(MarketId::new("2s"), Decimal::from(sum_evens * sum_evens));
        prices.insert(
            MarketId::new("3s"),
            Decimal::from(sum_mult3 * sum_mult3 * sum_mult3),
        );
        prices.insert(
            MarketId::new("4s"),
            if gt4.is_empty() {
                Decimal::ZERO
            } else {
                Decimal::from(gt4.iter().product::<i64>())
            },
        );
        prices.insert(
            MarketId::new("5s"),
            match le5.iter().min() {
                Some(&m) => Decimal::from(m.pow(5)),
                None => Decimal::ZERO,
            },
        );
        prices.insert(MarketId::new("6s"), Decimal::from(6 * sum_6up));
        prices
    }
}
