//! Market data ticks
//!
//! Ticks are immutable once built: fields are private and only exposed
//! through accessors. Time ordering is by event timestamp, then by local
//! receipt timestamp.

use crate::errors::ModelResult;
use crate::fixed::{Price, Quantity};
use crate::identifiers::{InstrumentId, TradeId};
use crate::types::{AggressorSide, Ts};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Best bid and ask observation for an instrument
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteTick {
    instrument_id: InstrumentId,
    bid: Price,
    ask: Price,
    bid_size: Quantity,
    ask_size: Quantity,
    ts_event: Ts,
    ts_init: Ts,
}

impl QuoteTick {
    /// Create a new quote
    ///
    /// # Errors
    ///
    /// [`crate::ModelError::PrecisionMismatch`] when bid and ask, or bid size
    /// and ask size, differ in precision.
    pub fn new(
        instrument_id: InstrumentId,
        bid: Price,
        ask: Price,
        bid_size: Quantity,
        ask_size: Quantity,
        ts_event: Ts,
        ts_init: Ts,
    ) -> ModelResult<Self> {
        bid.check_same_precision(&ask)?;
        bid_size.check_same_precision(&ask_size)?;
        Ok(Self {
            instrument_id,
            bid,
            ask,
            bid_size,
            ask_size,
            ts_event,
            ts_init,
        })
    }

    /// Create from already-scaled raw values
    ///
    /// # Errors
    ///
    /// Validation errors from [`crate::FixedPoint::from_raw`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        instrument_id: InstrumentId,
        bid: i64,
        ask: i64,
        price_precision: u8,
        bid_size: u64,
        ask_size: u64,
        size_precision: u8,
        ts_event: Ts,
        ts_init: Ts,
    ) -> ModelResult<Self> {
        Self::new(
            instrument_id,
            Price::from_raw(bid, price_precision)?,
            Price::from_raw(ask, price_precision)?,
            Quantity::from_raw(bid_size, size_precision)?,
            Quantity::from_raw(ask_size, size_precision)?,
            ts_event,
            ts_init,
        )
    }

    /// Instrument quoted
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Best bid price
    #[must_use]
    pub const fn bid(&self) -> Price {
        self.bid
    }

    /// Best ask price
    #[must_use]
    pub const fn ask(&self) -> Price {
        self.ask
    }

    /// Size at the best bid
    #[must_use]
    pub const fn bid_size(&self) -> Quantity {
        self.bid_size
    }

    /// Size at the best ask
    #[must_use]
    pub const fn ask_size(&self) -> Quantity {
        self.ask_size
    }

    /// Venue event timestamp
    #[must_use]
    pub const fn ts_event(&self) -> Ts {
        self.ts_event
    }

    /// Local receipt timestamp
    #[must_use]
    pub const fn ts_init(&self) -> Ts {
        self.ts_init
    }

    /// Mid price, see [`Price::midpoint`]
    ///
    /// # Errors
    ///
    /// [`crate::ModelError::Overflow`] for extreme raw values.
    pub fn mid_price(&self) -> ModelResult<Price> {
        Price::midpoint(&self.bid, &self.ask)
    }

    /// Ask minus bid
    ///
    /// # Errors
    ///
    /// [`crate::ModelError::Overflow`] for extreme raw values.
    pub fn spread(&self) -> ModelResult<Price> {
        self.ask.checked_sub(&self.bid)
    }
}

impl fmt::Display for QuoteTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.instrument_id,
            self.bid,
            self.ask,
            self.bid_size,
            self.ask_size,
            self.ts_event.as_nanos()
        )
    }
}

/// Single trade print for an instrument
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeTick {
    instrument_id: InstrumentId,
    price: Price,
    size: Quantity,
    aggressor_side: AggressorSide,
    trade_id: TradeId,
    ts_event: Ts,
    ts_init: Ts,
}

impl TradeTick {
    /// Create a new trade
    #[must_use]
    pub const fn new(
        instrument_id: InstrumentId,
        price: Price,
        size: Quantity,
        aggressor_side: AggressorSide,
        trade_id: TradeId,
        ts_event: Ts,
        ts_init: Ts,
    ) -> Self {
        Self {
            instrument_id,
            price,
            size,
            aggressor_side,
            trade_id,
            ts_event,
            ts_init,
        }
    }

    /// Create from already-scaled raw values
    ///
    /// # Errors
    ///
    /// Validation errors from [`crate::FixedPoint::from_raw`].
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw(
        instrument_id: InstrumentId,
        price: i64,
        price_precision: u8,
        size: u64,
        size_precision: u8,
        aggressor_side: AggressorSide,
        trade_id: TradeId,
        ts_event: Ts,
        ts_init: Ts,
    ) -> ModelResult<Self> {
        Ok(Self::new(
            instrument_id,
            Price::from_raw(price, price_precision)?,
            Quantity::from_raw(size, size_precision)?,
            aggressor_side,
            trade_id,
            ts_event,
            ts_init,
        ))
    }

    /// Instrument traded
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        &self.instrument_id
    }

    /// Execution price
    #[must_use]
    pub const fn price(&self) -> Price {
        self.price
    }

    /// Executed quantity
    #[must_use]
    pub const fn size(&self) -> Quantity {
        self.size
    }

    /// Side that crossed the spread
    #[must_use]
    pub const fn aggressor_side(&self) -> AggressorSide {
        self.aggressor_side
    }

    /// Venue trade identifier
    #[must_use]
    pub const fn trade_id(&self) -> &TradeId {
        &self.trade_id
    }

    /// Venue event timestamp
    #[must_use]
    pub const fn ts_event(&self) -> Ts {
        self.ts_event
    }

    /// Local receipt timestamp
    #[must_use]
    pub const fn ts_init(&self) -> Ts {
        self.ts_init
    }
}

impl fmt::Display for TradeTick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.instrument_id,
            self.price,
            self.size,
            self.aggressor_side,
            self.trade_id,
            self.ts_event.as_nanos()
        )
    }
}

/// Either kind of tick, for merged streams
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tick {
    /// Quote observation
    Quote(QuoteTick),
    /// Trade print
    Trade(TradeTick),
}

impl Tick {
    /// Instrument of the wrapped tick
    #[must_use]
    pub const fn instrument_id(&self) -> &InstrumentId {
        match self {
            Self::Quote(q) => q.instrument_id(),
            Self::Trade(t) => t.instrument_id(),
        }
    }

    /// Venue event timestamp
    #[must_use]
    pub const fn ts_event(&self) -> Ts {
        match self {
            Self::Quote(q) => q.ts_event,
            Self::Trade(t) => t.ts_event,
        }
    }

    /// Local receipt timestamp
    #[must_use]
    pub const fn ts_init(&self) -> Ts {
        match self {
            Self::Quote(q) => q.ts_init,
            Self::Trade(t) => t.ts_init,
        }
    }

    /// Time ordering: event timestamp, then receipt timestamp
    #[must_use]
    pub fn cmp_time(&self, other: &Self) -> Ordering {
        (self.ts_event(), self.ts_init()).cmp(&(other.ts_event(), other.ts_init()))
    }

    /// Stable sort of a merged stream into time order
    pub fn sort_by_time(ticks: &mut [Self]) {
        ticks.sort_by(Self::cmp_time);
    }
}

impl From<QuoteTick> for Tick {
    fn from(quote: QuoteTick) -> Self {
        Self::Quote(quote)
    }
}

impl From<TradeTick> for Tick {
    fn from(trade: TradeTick) -> Self {
        Self::Trade(trade)
    }
}
