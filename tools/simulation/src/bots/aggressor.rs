//! Spread-crossing bot
//!
//! Picks a random side each round and prices through the reference so the
//! order trades against whatever the quoters left resting.

use crate::bots::{at_least_one, reference_price};
use crate::harness::GameSim;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ServiceError;
use types::ids::{MarketId, OrderId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggressorConfig {
    /// Furthest whole-tick distance past the reference the bot will price
    pub reach: i64,
    pub min_shares: u32,
    pub max_shares: u32,
    /// Anchor used before the market shows any price
    pub base_price: Decimal,
}

impl Default for AggressorConfig {
    fn default() -> Self {
        Self {
            reach: 4,
            min_shares: 1,
            max_shares: 6,
            base_price: Decimal::from(50),
        }
    }
}

pub struct Aggressor {
    pub player: String,
    pub config: AggressorConfig,
    pub orders_placed: usize,
    rng: ChaCha8Rng,
}

impl Aggressor {
    pub fn new(player: impl Into<String>, config: AggressorConfig, seed: u64) -> Self {
        Self {
            player: player.into(),
            config,
            orders_placed: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Fire one marketable order on a random side
    pub fn strike(&mut self, sim: &GameSim, symbol: &MarketId) -> Result<OrderId, ServiceError> {
        let anchor = reference_price(sim, symbol).unwrap_or(self.config.base_price);
        let reach = Decimal::from(self.rng.gen_range(1..=self.config.reach));
        let shares = i64::from(self.rng.gen_range(self.config.min_shares..=self.config.max_shares));

        let (side, price) = if self.rng.gen_bool(0.5) {
            ("buy", at_least_one(anchor + reach))
        } else {
            ("sell", at_least_one(anchor - reach))
        };

        let id = sim.place(&self.player, symbol, side, price, shares)?;
        self.orders_placed += 1;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::quoter::{Quoter, QuoterConfig};
    use crate::harness::SimConfig;

    #[test]
    fn test_strikes_trade_against_rested_quotes() {
        let sim =
            GameSim::start(SimConfig::default(), &[("ana", "reds"), ("dov", "blues")]).unwrap();
        let sum = sim.symbols()[0].clone();

        let mut quoter = Quoter::new("ana", QuoterConfig::default(), 3);
        let mut aggressor = Aggressor::new("dov", AggressorConfig::default(), 4);

        for _ in 0..20 {
            quoter.quote(&sim, &sum).unwrap();
            aggressor.strike(&sim, &sum).unwrap();
        }

        assert_eq!(aggressor.orders_placed, 20);
        let trades = sim.trades(&sum);
        assert!(!trades.is_empty(), "crossing flow should print trades");
        for trade in &trades {
            assert_ne!(trade.buyer.team_id, trade.seller.team_id);
        }
    }

    #[test]
    fn test_same_team_strikes_never_print() {
        let sim =
            GameSim::start(SimConfig::default(), &[("ana", "reds"), ("ben", "reds")]).unwrap();
        let sum = sim.symbols()[0].clone();

        let mut quoter = Quoter::new("ana", QuoterConfig::default(), 3);
        let mut aggressor = Aggressor::new("ben", AggressorConfig::default(), 4);

        for _ in 0..10 {
            quoter.quote(&sim, &sum).unwrap();
            aggressor.strike(&sim, &sum).unwrap();
        }

        assert!(sim.trades(&sum).is_empty());
    }
}
