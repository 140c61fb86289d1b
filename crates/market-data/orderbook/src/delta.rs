//! Incremental updates and full snapshots fed into an [`OrderBook`]
//!
//! [`OrderBook`]: crate::OrderBook

use common::{OrderSide, Price, Quantity, Ts};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::order::{BookOrder, OrderId};

/// What a delta does to its ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookAction {
    /// New resting order
    Add,
    /// Price or size change of a resting order
    Update,
    /// Order removed
    Delete,
    /// Resting order traded against
    Fill,
    /// Whole side wiped
    Clear,
}

impl fmt::Display for BookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("ADD"),
            Self::Update => f.write_str("UPDATE"),
            Self::Delete => f.write_str("DELETE"),
            Self::Fill => f.write_str("FILL"),
            Self::Clear => f.write_str("CLEAR"),
        }
    }
}

/// Single incremental book event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDelta {
    /// Ladder the event applies to
    pub side: OrderSide,
    /// Kind of event
    pub action: BookAction,
    /// Order price (level price under L2)
    pub price: Price,
    /// Order size; the traded size for fills
    pub size: Quantity,
    /// Venue order id, ignored under L1 and L2
    pub order_id: OrderId,
    /// Feed sequence number
    pub sequence: u64,
    /// Venue event time
    pub ts_event: Ts,
}

impl BookDelta {
    /// Create a new delta
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        side: OrderSide,
        action: BookAction,
        price: Price,
        size: Quantity,
        order_id: OrderId,
        sequence: u64,
        ts_event: Ts,
    ) -> Self {
        Self {
            side,
            action,
            price,
            size,
            order_id,
            sequence,
            ts_event,
        }
    }

    /// Delta that wipes one side
    #[must_use]
    pub const fn clear(side: OrderSide, sequence: u64, ts_event: Ts) -> Self {
        Self {
            side,
            action: BookAction::Clear,
            price: Price::ZERO,
            size: Quantity::ZERO,
            order_id: 0,
            sequence,
            ts_event,
        }
    }
}

impl fmt::Display for BookDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}@{} seq={} ts={}",
            self.action,
            self.side,
            self.order_id,
            self.size,
            self.price,
            self.sequence,
            self.ts_event
        )
    }
}

/// Full state of both ladders at a sequence number
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Resting bids
    pub bids: Vec<BookOrder>,
    /// Resting asks
    pub asks: Vec<BookOrder>,
    /// Sequence the snapshot was taken at
    pub sequence: u64,
    /// Venue time of the snapshot
    pub ts_event: Ts,
}

impl BookSnapshot {
    /// Create a new snapshot
    #[must_use]
    pub const fn new(
        bids: Vec<BookOrder>,
        asks: Vec<BookOrder>,
        sequence: u64,
        ts_event: Ts,
    ) -> Self {
        Self {
            bids,
            asks,
            sequence,
            ts_event,
        }
    }

    /// Snapshot of an empty book
    #[must_use]
    pub const fn empty(sequence: u64, ts_event: Ts) -> Self {
        Self::new(Vec::new(), Vec::new(), sequence, ts_event)
    }
}

/// One line of a replay file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BookRecord {
    /// Incremental update
    Delta(BookDelta),
    /// Full snapshot
    Snapshot(BookSnapshot),
}

impl From<BookDelta> for BookRecord {
    fn from(delta: BookDelta) -> Self {
        Self::Delta(delta)
    }
}

impl From<BookSnapshot> for BookRecord {
    fn from(snapshot: BookSnapshot) -> Self {
        Self::Snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_json_shape() -> Result<(), serde_json::Error> {
        let line = concat!(
            r#"{"type":"delta","side":"Buy","action":"ADD","#,
            r#""price":{"raw":10025,"precision":2},"size":{"raw":10,"precision":0},"#,
            r#""order_id":1,"sequence":1,"ts_event":1000}"#
        );
        let record: BookRecord = serde_json::from_str(line)?;
        let BookRecord::Delta(delta) = record else {
            panic!("expected delta");
        };
        assert_eq!(delta.action, BookAction::Add);
        assert_eq!(delta.price.to_string(), "100.25");
        assert_eq!(delta.ts_event, Ts(1000));

        let line = r#"{"type":"snapshot","bids":[],"asks":[],"sequence":5,"ts_event":0}"#;
        let snapshot: BookRecord = serde_json::from_str(line)?;
        assert_eq!(snapshot, BookRecord::Snapshot(BookSnapshot::empty(5, Ts(0))));
        Ok(())
    }

    #[test]
    fn test_invalid_precision_rejected() {
        let line = concat!(
            r#"{"type":"delta","side":"Sell","action":"DELETE","#,
            r#""price":{"raw":1,"precision":10},"size":{"raw":0,"precision":0},"#,
            r#""order_id":1,"sequence":1,"ts_event":0}"#
        );
        assert!(serde_json::from_str::<BookRecord>(line).is_err());
    }

    #[test]
    fn test_clear_delta() {
        let delta = BookDelta::clear(OrderSide::Sell, 7, Ts(1));
        assert_eq!(delta.action, BookAction::Clear);
        assert!(delta.size.is_zero());
        assert_eq!(delta.to_string(), "CLEAR SELL 0 0@0 seq=7 ts=1ns");
    }
}
