//! Order book for a single instrument
//!
//! Incremental deltas go through [`OrderBook::apply_update`] and full state
//! through [`OrderBook::apply_snapshot`]. The book tracks feed sequence
//! numbers: a gap marks it stale, and it stays stale until the next snapshot.

use common::{BookType, InstrumentId, OrderSide, Price, QuoteTick, Ts};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use crate::config::OrderBookConfig;
use crate::delta::{BookAction, BookDelta, BookSnapshot};
use crate::error::{BookError, BookResult};
use crate::ladder::{Depth, Ladder};

/// Health of an order book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    /// No snapshot applied yet
    Uninitialized,
    /// In sync with the feed
    Live,
    /// Sequence integrity lost, waiting for a snapshot
    Stale,
    /// Shut down, terminal
    Closed,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("UNINITIALIZED"),
            Self::Live => f.write_str("LIVE"),
            Self::Stale => f.write_str("STALE"),
            Self::Closed => f.write_str("CLOSED"),
        }
    }
}

/// Bid and ask ladders for one instrument
#[derive(Debug, Clone)]
pub struct OrderBook {
    instrument_id: InstrumentId,
    config: OrderBookConfig,
    bids: Ladder,
    asks: Ladder,
    status: BookStatus,
    sequence: u64,
    ts_last: Ts,
    last_side: Option<OrderSide>,
    update_count: u64,
}

impl OrderBook {
    /// Create an empty, uninitialized book
    #[must_use]
    pub fn new(instrument_id: InstrumentId, config: OrderBookConfig) -> Self {
        Self {
            bids: Ladder::new(OrderSide::Buy, config.book_type),
            asks: Ladder::new(OrderSide::Sell, config.book_type),
            instrument_id,
            config,
            status: BookStatus::Uninitialized,
            sequence: 0,
            ts_last: Ts::default(),
            last_side: None,
            update_count: 0,
        }
    }

    /// Apply one incremental update
    ///
    /// Returns the book status afterwards. Deltas batched under one sequence
    /// number share it, so an update may repeat the last sequence or advance it
    /// by one. A skipped or decreasing sequence is not an error: the update is
    /// skipped and the book reports [`BookStatus::Stale`], as it does for every
    /// update received until the next snapshot.
    ///
    /// # Errors
    ///
    /// [`BookError::BookClosed`] after shutdown, [`BookError::Uninitialized`]
    /// before the first snapshot, or the ladder error for a rejected update.
    /// The book is unchanged on error.
    pub fn apply_update(&mut self, delta: &BookDelta) -> BookResult<BookStatus> {
        match self.status {
            BookStatus::Closed => return Err(BookError::BookClosed),
            BookStatus::Stale => {
                warn!(
                    instrument = %self.instrument_id,
                    sequence = delta.sequence,
                    "Dropping update on stale book"
                );
                return Ok(BookStatus::Stale);
            }
            BookStatus::Uninitialized if self.config.sequence_check => {
                debug!(instrument = %self.instrument_id, "Update before snapshot rejected");
                return Err(BookError::Uninitialized);
            }
            BookStatus::Uninitialized | BookStatus::Live => {}
        }

        if self.config.sequence_check && !self.in_sequence(delta.sequence) {
            warn!(
                instrument = %self.instrument_id,
                last = self.sequence,
                received = delta.sequence,
                "Sequence gap, book stale until resync"
            );
            self.status = BookStatus::Stale;
            return Ok(BookStatus::Stale);
        }

        let ladder = match delta.side {
            OrderSide::Buy => &mut self.bids,
            OrderSide::Sell => &mut self.asks,
        };
        let result = match delta.action {
            BookAction::Add => {
                ladder.add_order(delta.price, delta.size, delta.order_id, delta.sequence)
            }
            BookAction::Update => {
                ladder.update_order(delta.order_id, delta.price, delta.size, delta.sequence)
            }
            BookAction::Delete => ladder.delete_order_at(delta.price, delta.order_id).map(|_| ()),
            BookAction::Fill => ladder.fill_order(delta.order_id, delta.price, delta.size),
            BookAction::Clear => {
                ladder.clear();
                Ok(())
            }
        };
        if let Err(e) = result {
            debug!(instrument = %self.instrument_id, %delta, error = %e, "Update rejected");
            return Err(e);
        }

        self.sequence = delta.sequence;
        self.ts_last = delta.ts_event;
        self.last_side = Some(delta.side);
        self.update_count += 1;
        self.status = BookStatus::Live;
        Ok(self.status)
    }

    /// Replace both ladders with a full snapshot and go live
    ///
    /// The new ladders are built first and swapped in only when every order
    /// in the snapshot was accepted.
    ///
    /// # Errors
    ///
    /// [`BookError::BookClosed`] after shutdown, or the ladder error for the
    /// first rejected snapshot order. The book is unchanged on error.
    pub fn apply_snapshot(&mut self, snapshot: &BookSnapshot) -> BookResult<()> {
        if self.status == BookStatus::Closed {
            return Err(BookError::BookClosed);
        }

        let mut bids = Ladder::new(OrderSide::Buy, self.config.book_type);
        let mut asks = Ladder::new(OrderSide::Sell, self.config.book_type);
        for (ladder, orders) in [(&mut bids, &snapshot.bids), (&mut asks, &snapshot.asks)] {
            for order in orders {
                ladder
                    .add_order(order.price, order.size, order.order_id, order.sequence)
                    .inspect_err(|e| {
                        debug!(
                            instrument = %self.instrument_id,
                            %order,
                            error = %e,
                            "Snapshot rejected"
                        );
                    })?;
            }
        }

        let previous = self.status;
        self.bids = bids;
        self.asks = asks;
        self.sequence = snapshot.sequence;
        self.ts_last = snapshot.ts_event;
        self.status = BookStatus::Live;

        if previous == BookStatus::Stale {
            info!(
                instrument = %self.instrument_id,
                sequence = snapshot.sequence,
                "Book resynced from snapshot"
            );
        } else {
            info!(
                instrument = %self.instrument_id,
                sequence = snapshot.sequence,
                bid_levels = self.bids.len(),
                ask_levels = self.asks.len(),
                "Snapshot applied"
            );
        }
        Ok(())
    }

    /// Close the book; every later call fails with [`BookError::BookClosed`]
    ///
    /// # Errors
    ///
    /// [`BookError::BookClosed`] when already closed.
    pub fn shutdown(&mut self) -> BookResult<()> {
        if self.status == BookStatus::Closed {
            return Err(BookError::BookClosed);
        }
        self.bids.clear();
        self.asks.clear();
        self.status = BookStatus::Closed;
        info!(
            instrument = %self.instrument_id,
            updates = self.update_count,
            "Book shut down"
        );
        Ok(())
    }

    /// Best bid price
    ///
    /// # Errors
    ///
    /// [`BookError::EmptyLadder`] with no bids, or the book is not readable.
    pub fn best_bid(&self) -> BookResult<Price> {
        self.readable()?;
        self.bids.best_price()
    }

    /// Best ask price
    ///
    /// # Errors
    ///
    /// [`BookError::EmptyLadder`] with no asks, or the book is not readable.
    pub fn best_ask(&self) -> BookResult<Price> {
        self.readable()?;
        self.asks.best_price()
    }

    /// Best ask minus best bid
    ///
    /// # Errors
    ///
    /// As [`OrderBook::best_bid`], plus model errors from the subtraction.
    pub fn spread(&self) -> BookResult<Price> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Ok(ask.checked_sub(&bid)?)
    }

    /// Midpoint of best bid and best ask, one digit finer than the prices
    ///
    /// # Errors
    ///
    /// As [`OrderBook::best_bid`], plus model errors from the midpoint.
    pub fn mid_price(&self) -> BookResult<Price> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Ok(Price::midpoint(&bid, &ask)?)
    }

    /// Best `n` levels of one side, capped at the configured depth
    ///
    /// # Errors
    ///
    /// Fails when the book is not readable.
    pub fn depth(&self, side: OrderSide, n: usize) -> BookResult<Depth<'_>> {
        self.readable()?;
        let n = n.min(self.config.max_depth);
        Ok(match side {
            OrderSide::Buy => self.bids.depth(n),
            OrderSide::Sell => self.asks.depth(n),
        })
    }

    /// Best bid and ask with their sizes as a quote
    ///
    /// # Errors
    ///
    /// Fails when either side is empty or the book is not readable.
    pub fn top_of_book(&self) -> BookResult<QuoteTick> {
        self.readable()?;
        let bid = self.bids.top().ok_or(BookError::EmptyLadder {
            side: OrderSide::Buy,
        })?;
        let ask = self.asks.top().ok_or(BookError::EmptyLadder {
            side: OrderSide::Sell,
        })?;
        Ok(QuoteTick::new(
            self.instrument_id.clone(),
            bid.price().value,
            ask.price().value,
            bid.size(),
            ask.size(),
            self.ts_last,
            self.ts_last,
        )?)
    }

    /// Whether the best bid is at or above the best ask
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        match (self.best_bid(), self.best_ask()) {
            (Ok(bid), Ok(ask)) => bid >= ask,
            _ => false,
        }
    }

    /// Bid ladder
    #[must_use]
    pub const fn bids(&self) -> &Ladder {
        &self.bids
    }

    /// Ask ladder
    #[must_use]
    pub const fn asks(&self) -> &Ladder {
        &self.asks
    }

    /// Instrument this book tracks
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Ladder granularity
    #[must_use]
    pub const fn book_type(&self) -> BookType {
        self.config.book_type
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &OrderBookConfig {
        &self.config
    }

    /// Current health
    #[must_use]
    pub const fn status(&self) -> BookStatus {
        self.status
    }

    /// Sequence of the last applied update or snapshot
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Event time of the last applied update or snapshot
    #[must_use]
    pub const fn ts_last(&self) -> Ts {
        self.ts_last
    }

    /// Side touched by the last applied update
    #[must_use]
    pub const fn last_side(&self) -> Option<OrderSide> {
        self.last_side
    }

    /// Number of applied incremental updates
    #[must_use]
    pub const fn update_count(&self) -> u64 {
        self.update_count
    }

    fn in_sequence(&self, sequence: u64) -> bool {
        sequence == self.sequence || self.sequence.checked_add(1) == Some(sequence)
    }

    fn readable(&self) -> BookResult<()> {
        match self.status {
            BookStatus::Closed => Err(BookError::BookClosed),
            BookStatus::Stale => Err(BookError::StaleBook {
                last_sequence: self.sequence,
            }),
            BookStatus::Uninitialized | BookStatus::Live => Ok(()),
        }
    }
}

impl fmt::Display for OrderBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "OrderBook({}, {}, {}, seq={}, updates={})",
            self.instrument_id,
            self.config.book_type,
            self.status,
            self.sequence,
            self.update_count
        )?;
        writeln!(f, "  {}", self.bids)?;
        write!(f, "  {}", self.asks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::BookOrder;
    use common::Quantity;

    fn px(raw: i64) -> Price {
        Price::from_raw(raw, 2).unwrap()
    }

    fn qty(raw: u64) -> Quantity {
        Quantity::from_raw(raw, 0).unwrap()
    }

    fn add(side: OrderSide, raw: i64, size: u64, id: u64, seq: u64) -> BookDelta {
        BookDelta::new(side, BookAction::Add, px(raw), qty(size), id, seq, Ts(seq * 10))
    }

    fn new_book() -> OrderBook {
        OrderBook::new("BTCUSDT.BINANCE".parse().unwrap(), OrderBookConfig::default())
    }

    fn live_book() -> OrderBook {
        let mut book = new_book();
        book.apply_snapshot(&BookSnapshot::empty(0, Ts(0))).unwrap();
        book
    }

    #[test]
    fn test_update_before_snapshot_rejected() {
        let mut book = new_book();
        assert_eq!(book.status(), BookStatus::Uninitialized);
        assert_eq!(
            book.apply_update(&add(OrderSide::Buy, 100, 1, 1, 1)),
            Err(BookError::Uninitialized)
        );
        assert!(book.bids().is_empty());
    }

    #[test]
    fn test_records_last_update() {
        let mut book = live_book();
        let status = book.apply_update(&add(OrderSide::Sell, 10_100, 2, 1, 1)).unwrap();
        assert_eq!(status, BookStatus::Live);
        assert_eq!(book.sequence(), 1);
        assert_eq!(book.ts_last(), Ts(10));
        assert_eq!(book.last_side(), Some(OrderSide::Sell));
        assert_eq!(book.update_count(), 1);
    }

    #[test]
    fn test_rejected_update_leaves_state() {
        let mut book = live_book();
        book.apply_update(&add(OrderSide::Buy, 10_000, 2, 1, 1)).unwrap();
        let dup = add(OrderSide::Buy, 10_050, 2, 1, 2);
        assert!(matches!(
            book.apply_update(&dup),
            Err(BookError::DuplicateOrder { order_id: 1, .. })
        ));
        assert_eq!(book.sequence(), 1);
        assert_eq!(book.update_count(), 1);
        assert_eq!(book.best_bid().unwrap(), px(10_000));
    }

    #[test]
    fn test_snapshot_is_all_or_nothing() {
        let mut book = live_book();
        book.apply_update(&add(OrderSide::Buy, 10_000, 2, 1, 1)).unwrap();

        let order = BookOrder::new(5, OrderSide::Buy, px(9_900), qty(1), 9);
        let bad = BookSnapshot::new(vec![order, order], Vec::new(), 9, Ts(90));
        assert!(book.apply_snapshot(&bad).is_err());
        assert_eq!(book.sequence(), 1);
        assert_eq!(book.best_bid().unwrap(), px(10_000));
    }

    #[test]
    fn test_top_of_book_and_cross() {
        let mut book = live_book();
        book.apply_update(&add(OrderSide::Buy, 10_000, 3, 1, 1)).unwrap();
        book.apply_update(&add(OrderSide::Sell, 10_010, 4, 2, 2)).unwrap();

        let quote = book.top_of_book().unwrap();
        assert_eq!(quote.bid(), px(10_000));
        assert_eq!(quote.ask_size(), qty(4));
        assert_eq!(book.spread().unwrap(), px(10));
        assert_eq!(book.mid_price().unwrap().to_string(), "100.050");
        assert!(!book.is_crossed());

        book.apply_update(&add(OrderSide::Buy, 10_010, 1, 3, 3)).unwrap();
        assert!(book.is_crossed());
    }

    #[test]
    fn test_shutdown_is_terminal() {
        let mut book = live_book();
        book.shutdown().unwrap();
        assert_eq!(book.status(), BookStatus::Closed);
        assert_eq!(book.shutdown(), Err(BookError::BookClosed));
        assert_eq!(book.best_ask(), Err(BookError::BookClosed));
        assert_eq!(
            book.apply_snapshot(&BookSnapshot::empty(1, Ts(0))),
            Err(BookError::BookClosed)
        );
        assert_eq!(
            book.apply_update(&add(OrderSide::Buy, 1, 1, 1, 1)),
            Err(BookError::BookClosed)
        );
    }

    #[test]
    fn test_unchecked_book_accepts_any_sequence() {
        let config = OrderBookConfig {
            book_type: BookType::L1Tbbo,
            sequence_check: false,
            max_depth: 1,
        };
        let mut book = OrderBook::new("EURUSD.IDEALPRO".parse().unwrap(), config);
        book.apply_update(&add(OrderSide::Buy, 10_000, 1, 0, 7)).unwrap();
        book.apply_update(&add(OrderSide::Buy, 10_001, 2, 0, 3)).unwrap();
        assert_eq!(book.status(), BookStatus::Live);
        assert_eq!(book.sequence(), 3);
        assert_eq!(
            book.depth(OrderSide::Buy, 5).unwrap().collect::<Vec<_>>(),
            vec![(px(10_001), qty(2))]
        );
    }

    #[test]
    fn test_display() {
        let mut book = live_book();
        book.apply_update(&add(OrderSide::Buy, 10_000, 3, 1, 1)).unwrap();
        assert_eq!(
            book.to_string(),
            concat!(
                "OrderBook(BTCUSDT.BINANCE, L3_MBO, LIVE, seq=1, updates=1)\n",
                "  Ladder(BUY, 1 levels, 100.00x3)\n",
                "  Ladder(SELL, 0 levels)"
            )
        );
    }
}
