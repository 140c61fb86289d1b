//! Event timestamps

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp in nanoseconds since UNIX epoch
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Ts(pub u64);

impl Ts {
    /// Create timestamp from nanoseconds
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Get timestamp as nanoseconds
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Get timestamp as microseconds
    #[must_use]
    pub const fn as_micros(&self) -> u64 {
        self.0 / 1000
    }

    /// Get timestamp as milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0 / 1_000_000
    }

    /// RFC 3339 rendering with nanosecond digits, `None` past year 2262
    #[must_use]
    pub fn to_rfc3339(&self) -> Option<String> {
        let nanos = i64::try_from(self.0).ok()?;
        let time = DateTime::<Utc>::from_timestamp_nanos(nanos);
        Some(time.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}

impl fmt::Display for Ts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OrderSide {
    /// Buy side (bid)
    Buy = 1,
    /// Sell side (ask/offer)
    Sell = 2,
}

impl OrderSide {
    /// Get the opposite side
    #[inline]
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// Side that initiated a trade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggressorSide {
    /// Venue did not report the aggressor
    #[default]
    NoAggressor,
    /// Buyer lifted the offer
    Buyer,
    /// Seller hit the bid
    Seller,
}

impl fmt::Display for AggressorSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAggressor => f.write_str("NO_AGGRESSOR"),
            Self::Buyer => f.write_str("BUYER"),
            Self::Seller => f.write_str("SELLER"),
        }
    }
}

/// Order book granularity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookType {
    /// Top of book only
    #[serde(rename = "L1_TBBO")]
    L1Tbbo,
    /// Aggregated market by price
    #[serde(rename = "L2_MBP")]
    L2Mbp,
    /// Full market by order
    #[default]
    #[serde(rename = "L3_MBO")]
    L3Mbo,
}

impl fmt::Display for BookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L1Tbbo => f.write_str("L1_TBBO"),
            Self::L2Mbp => f.write_str("L2_MBP"),
            Self::L3Mbo => f.write_str("L3_MBO"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bincode;

    #[test]
    fn test_ts_serde() -> Result<(), Box<dyn std::error::Error>> {
        let ts = Ts::from_nanos(1_234_567_890);
        let encoded = bincode::serialize(&ts)?;
        let decoded: Ts = bincode::deserialize(&encoded)?;
        assert_eq!(ts, decoded);
        Ok(())
    }

    #[test]
    fn test_ts_conversions() {
        let ts = Ts::from_nanos(1_234_567_890);
        assert_eq!(ts.as_nanos(), 1_234_567_890);
        assert_eq!(ts.as_micros(), 1_234_567);
        assert_eq!(ts.as_millis(), 1_234);
    }

    #[test]
    fn test_ts_rfc3339() {
        let ts = Ts::from_nanos(1_600_000_000_000_000_001);
        assert_eq!(
            ts.to_rfc3339().as_deref(),
            Some("2020-09-13T12:26:40.000000001Z")
        );
        assert!(Ts::from_nanos(u64::MAX).to_rfc3339().is_none());
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
    }

    #[test]
    fn test_book_type_names() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(BookType::L2Mbp.to_string(), "L2_MBP");
        let parsed: BookType = serde_json::from_str("\"L1_TBBO\"")?;
        assert_eq!(parsed, BookType::L1Tbbo);
        Ok(())
    }
}
