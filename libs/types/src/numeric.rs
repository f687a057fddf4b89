//! Numeric types for prices and share quantities
//!
//! Prices use rust_decimal for deterministic arithmetic (no floating-point
//! errors); the midpoint of two limit prices is exact, so settlement math
//! never accumulates rounding drift. Share quantities are whole numbers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated order limit price
///
/// Always strictly positive. Derived values (trade midpoints, market
/// summaries, final prices) are plain `Decimal`s since they are outputs,
/// not caller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Validate a decimal as a limit price, rejecting zero and negatives
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Construct from a positive integer
    ///
    /// # Panics
    /// Panics on zero; intended for literals in tests and fixtures.
    pub fn from_u64(value: u64) -> Self {
        assert!(value > 0, "Price must be positive");
        Self(Decimal::from(value))
    }

    /// Parse from a decimal string, rejecting non-positive values
    pub fn from_str(s: &str) -> Option<Self> {
        s.parse::<Decimal>().ok().and_then(Self::try_new)
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Arithmetic mean of two limit prices
    ///
    /// The trade-pricing rule: a fill between limit prices `a` and `b`
    /// executes at `(a + b) / 2` exactly.
    pub fn midpoint(a: Price, b: Price) -> Decimal {
        (a.0 + b.0) / Decimal::TWO
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A whole-number share quantity
///
/// Zero is representable because remainders drain to zero as orders fill;
/// the "shares must be positive" rule applies only at submission and is
/// checked at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shares(u32);

impl Shares {
    pub const ZERO: Shares = Shares(0);

    pub fn new(count: u32) -> Self {
        Self(count)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Subtract a fill, stopping at zero
    pub fn saturating_sub(&self, other: Shares) -> Shares {
        Shares(self.0.saturating_sub(other.0))
    }

    /// Decimal view for pnl arithmetic
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }
}

impl fmt::Display for Shares {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
