//! Order lifecycle types

use crate::ids::{OrderId, TeamId, UserId};
use crate::numeric::{Price, Shares};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Parse a wire-format side string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// Order status
///
/// `Open` is the only live state; `Filled` and `Cancelled` are terminal and
/// the record is immutable once either is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }
}

/// A resting or just-placed limit order
///
/// Invariants: `shares_remaining <= shares_original`;
/// `status == Filled` implies `shares_remaining == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub team_id: TeamId,
    pub side: Side,
    pub price: Price,
    pub shares_original: Shares,
    pub shares_remaining: Shares,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new open order with the full quantity remaining
    pub fn new(
        id: OrderId,
        user_id: UserId,
        team_id: TeamId,
        side: Side,
        price: Price,
        shares: Shares,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            team_id,
            side,
            price,
            shares_original: shares,
            shares_remaining: shares,
            status: OrderStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// Apply a fill, flipping to `Filled` when the remainder drains to zero
    ///
    /// # Panics
    /// Panics if the order is not open or the fill exceeds the remainder.
    pub fn apply_fill(&mut self, qty: Shares, now: DateTime<Utc>) {
        assert!(self.is_open(), "Cannot fill a non-open order");
        assert!(
            qty.get() > 0 && qty <= self.shares_remaining,
            "Fill must be positive and within the remainder"
        );

        self.shares_remaining = self.shares_remaining.saturating_sub(qty);
        if self.shares_remaining.is_zero() {
            self.status = OrderStatus::Filled;
        }
        self.updated_at = now;

        debug_assert!(self.check_invariant());
    }

    /// Cancel the order, zeroing the remainder
    ///
    /// # Panics
    /// Panics if the order is already terminal.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        assert!(self.is_open(), "Cannot cancel a terminal order");
        self.status = OrderStatus::Cancelled;
        self.shares_remaining = Shares::ZERO;
        self.updated_at = now;
    }

    /// Check the quantity/status invariant
    pub fn check_invariant(&self) -> bool {
        self.shares_remaining <= self.shares_original
            && (self.status != OrderStatus::Filled || self.shares_remaining.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order(side: Side, price: u64, shares: u32) -> Order {
        Order::new(
            OrderId::new(),
            UserId::new("u-1"),
            TeamId::new(),
            side,
            Price::from_u64(price),
            Shares::new(shares),
            Utc::now(),
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("buy"), Some(Side::Buy));
        assert_eq!(Side::parse("sell"), Some(Side::Sell));
        assert_eq!(Side::parse("BUY"), None);
        assert_eq!(Side::parse("hold"), None);
    }

    #[test]
    fn test_order_creation() {
        let order = test_order(Side::Buy, 10, 5);
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.shares_remaining, Shares::new(5));
        assert!(order.check_invariant());
    }

    #[test]
    fn test_partial_then_full_fill() {
        let mut order = test_order(Side::Sell, 8, 5);

        order.apply_fill(Shares::new(2), Utc::now());
        assert_eq!(order.status, OrderStatus::Open);
        assert_eq!(order.shares_remaining, Shares::new(3));
        assert!(order.check_invariant());

        order.apply_fill(Shares::new(3), Utc::now());
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.shares_remaining.is_zero());
        assert!(order.check_invariant());
    }

    #[test]
    #[should_panic(expected = "Fill must be positive and within the remainder")]
    fn test_overfill_panics() {
        let mut order = test_order(Side::Buy, 10, 5);
        order.apply_fill(Shares::new(6), Utc::now());
    }

    #[test]
    fn test_cancel_zeroes_remainder() {
        let mut order = test_order(Side::Buy, 10, 5);
        order.cancel(Utc::now());
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.shares_remaining.is_zero());
        assert!(order.status.is_terminal());
    }

    #[test]
    #[should_panic(expected = "Cannot cancel a terminal order")]
    fn test_cancel_terminal_panics() {
        let mut order = test_order(Side::Buy, 10, 5);
        order.apply_fill(Shares::new(5), Utc::now());
        order.cancel(Utc::now());
    }

    #[test]
    fn test_order_serialization() {
        let order = test_order(Side::Sell, 12, 7);
        let json = serde_json::to_string(&order).unwrap();
        assert!(json.contains("\"sell\""));
        assert!(json.contains("\"open\""));

        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
