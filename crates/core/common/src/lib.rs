//! Common value types for ShrivenQ trading platform
//!
//! Exact fixed-precision prices, quantities and money, validated identifiers,
//! and immutable market data ticks built on top of them.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod errors;
pub mod fixed;
pub mod identifiers;
pub mod market;
pub mod money;
pub mod types;

pub use errors::{ModelError, ModelResult};
pub use fixed::{FIXED_PRECISION, FIXED_SCALAR, FixedPoint, Price, Quantity, RawValue};
pub use identifiers::{
    AccountId, ClientOrderId, InstrumentId, PositionId, StrategyId, Symbol, TradeId, TraderId,
    Venue, VenueOrderId,
};
pub use market::{QuoteTick, Tick, TradeTick};
pub use money::{Currency, CurrencyType, Money};
pub use types::{AggressorSide, BookType, OrderSide, Ts};
