//! Resting orders and the ladder sort key

use common::{OrderSide, Price, Quantity};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Venue order identifier
pub type OrderId = u64;

/// Order resting on a ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOrder {
    /// Order identifier
    pub order_id: OrderId,
    /// Side of the order
    pub side: OrderSide,
    /// Limit price
    pub price: Price,
    /// Remaining quantity
    pub size: Quantity,
    /// Feed sequence of the event that last touched this order
    pub sequence: u64,
}

impl BookOrder {
    /// Create a new book order
    #[must_use]
    pub const fn new(
        order_id: OrderId,
        side: OrderSide,
        price: Price,
        size: Quantity,
        sequence: u64,
    ) -> Self {
        Self {
            order_id,
            side,
            price,
            size,
            sequence,
        }
    }

    /// Ladder key for this order's price
    #[must_use]
    pub const fn book_price(&self) -> BookPrice {
        BookPrice::new(self.price, self.side)
    }
}

impl fmt::Display for BookOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} @ {} (seq {})",
            self.order_id, self.side, self.size, self.price, self.sequence
        )
    }
}

/// Price with a side, ordered best-first
///
/// Bids sort descending and asks ascending, so the first key of a ladder is
/// always the best price. Keys compare by price only: time priority between
/// orders at the same price is kept inside the level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BookPrice {
    /// Price value
    pub value: Price,
    /// Ladder side
    pub side: OrderSide,
}

impl BookPrice {
    /// Create a new book price
    #[must_use]
    pub const fn new(value: Price, side: OrderSide) -> Self {
        Self { value, side }
    }
}

impl PartialEq for BookPrice {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Eq for BookPrice {}

impl PartialOrd for BookPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BookPrice {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.side {
            OrderSide::Buy => other.value.cmp(&self.value),
            OrderSide::Sell => self.value.cmp(&other.value),
        }
    }
}

impl fmt::Display for BookPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
