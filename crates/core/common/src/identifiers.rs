//! Validated string identifiers
//!
//! Identifiers hold a shared `Arc<str>`: cloning hands out another owned
//! reference to the same text and dropping releases it. Construction borrows
//! the caller's `&str` only for the duration of the call.

use crate::errors::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

fn check_identifier(kind: &str, value: &str) -> ModelResult<()> {
    if value.is_empty() {
        return Err(ModelError::InvalidIdentifier(format!("{kind} is empty")));
    }
    if !value.is_ascii() || value.chars().any(|c| c.is_ascii_whitespace() || c.is_ascii_control()) {
        return Err(ModelError::InvalidIdentifier(format!(
            "{kind} '{value}' must be printable ASCII without whitespace"
        )));
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Arc<str>);

        impl $name {
            /// Create a new identifier, copying the borrowed text
            ///
            /// # Errors
            ///
            /// [`ModelError::InvalidIdentifier`] for empty text, non-ASCII
            /// text or text containing whitespace.
            pub fn new(value: &str) -> ModelResult<Self> {
                check_identifier(stringify!($name), value)?;
                Ok(Self(Arc::from(value)))
            }

            /// Borrow the identifier text
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

identifier!(
    /// Ticker or native venue symbol, e.g. `BTCUSDT`
    Symbol
);

identifier!(
    /// Trading venue, e.g. `BINANCE`
    Venue
);

identifier!(
    /// Venue-assigned trade match identifier
    TradeId
);

identifier!(
    /// Trader instance, e.g. `TRADER-001`
    TraderId
);

identifier!(
    /// Strategy instance within a trader
    StrategyId
);

identifier!(
    /// Order id assigned by the client before submission
    ClientOrderId
);

identifier!(
    /// Order id assigned by the venue on acceptance
    VenueOrderId
);

identifier!(
    /// Account at a venue, e.g. `BINANCE-001`
    AccountId
);

identifier!(
    /// Position identifier
    PositionId
);

/// Instrument identity: symbol plus venue, rendered `SYMBOL.VENUE`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InstrumentId {
    symbol: Symbol,
    venue: Venue,
}

impl InstrumentId {
    /// Create from its parts
    #[must_use]
    pub const fn new(symbol: Symbol, venue: Venue) -> Self {
        Self { symbol, venue }
    }

    /// Symbol part
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Venue part
    #[must_use]
    pub const fn venue(&self) -> &Venue {
        &self.venue
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.venue)
    }
}

impl FromStr for InstrumentId {
    type Err = ModelError;

    /// Parse `SYMBOL.VENUE`, splitting on the last `.` so symbols may contain dots
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (symbol, venue) = s.rsplit_once('.').ok_or_else(|| {
            ModelError::InvalidIdentifier(format!("InstrumentId '{s}' missing '.' separator"))
        })?;
        Ok(Self::new(Symbol::new(symbol)?, Venue::new(venue)?))
    }
}

impl TryFrom<String> for InstrumentId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<InstrumentId> for String {
    fn from(id: InstrumentId) -> Self {
        id.to_string()
    }
}
