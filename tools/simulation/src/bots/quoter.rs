//! Two-sided quoting bot
//!
//! Posts one buy and one sell around the reference price each round,
//! supplying the resting liquidity the aggressors trade against.

use crate::bots::{at_least_one, reference_price};
use crate::harness::GameSim;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ServiceError;
use types::ids::MarketId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoterConfig {
    /// Distance between the posted buy and sell
    pub spread: Decimal,
    /// Uniform whole-tick shift applied to both quotes per round
    pub jitter: i64,
    pub min_shares: u32,
    pub max_shares: u32,
    /// Anchor used before the market shows any price
    pub base_price: Decimal,
}

impl Default for QuoterConfig {
    fn default() -> Self {
        Self {
            spread: Decimal::from(4),
            jitter: 2,
            min_shares: 1,
            max_shares: 9,
            base_price: Decimal::from(50),
        }
    }
}

pub struct Quoter {
    pub player: String,
    pub config: QuoterConfig,
    pub orders_placed: usize,
    rng: ChaCha8Rng,
}

impl Quoter {
    pub fn new(player: impl Into<String>, config: QuoterConfig, seed: u64) -> Self {
        Self {
            player: player.into(),
            config,
            orders_placed: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Post a buy below and a sell above the market's reference price
    ///
    /// Returns the number of orders placed (always 2).
    pub fn quote(&mut self, sim: &GameSim, symbol: &MarketId) -> Result<usize, ServiceError> {
        let anchor = reference_price(sim, symbol).unwrap_or(self.config.base_price);
        let shift = Decimal::from(self.rng.gen_range(-self.config.jitter..=self.config.jitter));
        let half = self.config.spread / Decimal::from(2);
        let shares = i64::from(self.rng.gen_range(self.config.min_shares..=self.config.max_shares));

        let bid = at_least_one(anchor + shift - half);
        let ask = at_least_one(anchor + shift + half);

        sim.place(&self.player, symbol, "buy", bid, shares)?;
        sim.place(&self.player, symbol, "sell", ask, shares)?;
        self.orders_placed += 2;
        Ok(2)
    }
}
