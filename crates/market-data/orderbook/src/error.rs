//! Error types for ladder and order book operations

use common::{ModelError, OrderSide};
use thiserror::Error;

use crate::order::OrderId;

/// Order book errors
///
/// Every failing operation leaves the ladder and book exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookError {
    /// Order id not resting on the ladder
    #[error("Order {order_id} not found on {side} ladder")]
    NotFound {
        /// Missing order id
        order_id: OrderId,
        /// Ladder side searched
        side: OrderSide,
    },

    /// Order id already resting on the ladder
    #[error("Duplicate order {order_id} on {side} ladder")]
    DuplicateOrder {
        /// Duplicated order id
        order_id: OrderId,
        /// Ladder side
        side: OrderSide,
    },

    /// Add or update with zero quantity
    #[error("Order {order_id} has zero quantity")]
    ZeroQuantity {
        /// Offending order id
        order_id: OrderId,
    },

    /// Query on a ladder with no levels
    #[error("Empty {side} ladder")]
    EmptyLadder {
        /// Empty side
        side: OrderSide,
    },

    /// Incremental update before the first snapshot
    #[error("Book not initialized: snapshot required")]
    Uninitialized,

    /// Query on a book that lost sequence integrity
    #[error("Book stale since sequence {last_sequence}: resync required")]
    StaleBook {
        /// Last sequence applied before the gap
        last_sequence: u64,
    },

    /// Any call after shutdown
    #[error("Book closed")]
    BookClosed,

    /// Numeric failure from the value model
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result alias for order book operations
pub type BookResult<T> = Result<T, BookError>;
