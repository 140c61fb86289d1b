//! Scaled-integer fixed-point values
//!
//! A [`FixedPoint`] stores a decimal number as an integer `raw` scaled by
//! `10^precision`. Prices and money use a signed `i64` raw, quantities an
//! unsigned `u64` raw. Arithmetic is exact and checked: nothing wraps, nothing
//! rounds after construction.

use crate::errors::{ModelError, ModelResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Maximum supported decimal precision
pub const FIXED_PRECISION: u8 = 9;

/// Scale divisor at maximum precision
pub const FIXED_SCALAR: u64 = 1_000_000_000;

const POWERS_OF_TEN: [u64; 10] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    FIXED_SCALAR,
];

mod sealed {
    pub trait Sealed {}
}

/// Integer types usable as the raw storage of a [`FixedPoint`]
pub trait RawValue:
    sealed::Sealed
    + Copy
    + Eq
    + Ord
    + Default
    + fmt::Debug
    + fmt::Display
    + Into<i128>
    + TryFrom<i128>
    + Serialize
    + for<'de> Deserialize<'de>
    + Send
    + Sync
    + 'static
{
    /// Zero raw value
    const ZERO: Self;
    /// Whether negative values are representable
    const SIGNED: bool;

    /// Checked addition, `None` on overflow
    fn checked_add(self, rhs: Self) -> Option<Self>;

    /// Checked subtraction, `None` on overflow or underflow
    fn checked_sub(self, rhs: Self) -> Option<Self>;
}

macro_rules! impl_raw_value {
    ($ty:ty, $signed:expr) => {
        impl sealed::Sealed for $ty {}

        impl RawValue for $ty {
            const ZERO: Self = 0;
            const SIGNED: bool = $signed;

            #[inline]
            fn checked_add(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_add(self, rhs)
            }

            #[inline]
            fn checked_sub(self, rhs: Self) -> Option<Self> {
                <$ty>::checked_sub(self, rhs)
            }
        }
    };
}

impl_raw_value!(i64, true);
impl_raw_value!(u64, false);

/// Fixed-point decimal: `raw / 10^precision`
///
/// Equality, ordering and hashing compare the represented value, so `1.0`
/// at precision 1 equals `1.00` at precision 2. Arithmetic still requires
/// identical precision.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "RawParts<R>", bound = "")]
pub struct FixedPoint<R: RawValue> {
    raw: R,
    precision: u8,
}

/// Signed fixed-point price, may be negative (spreads, some derivatives)
pub type Price = FixedPoint<i64>;

/// Unsigned fixed-point quantity
pub type Quantity = FixedPoint<u64>;

#[derive(Deserialize)]
struct RawParts<R> {
    raw: R,
    precision: u8,
}

impl<R: RawValue> TryFrom<RawParts<R>> for FixedPoint<R> {
    type Error = ModelError;

    fn try_from(parts: RawParts<R>) -> Result<Self, Self::Error> {
        Self::from_raw(parts.raw, parts.precision)
    }
}

/// Reject precisions above [`FIXED_PRECISION`]
pub const fn check_precision(precision: u8) -> ModelResult<()> {
    if precision > FIXED_PRECISION {
        return Err(ModelError::InvalidPrecision {
            precision,
            max: FIXED_PRECISION,
        });
    }
    Ok(())
}

impl<R: RawValue> FixedPoint<R> {
    /// Zero at precision 0
    pub const ZERO: Self = Self {
        raw: R::ZERO,
        precision: 0,
    };

    /// Create from a decimal value, rounding half away from zero to `precision`
    ///
    /// # Errors
    ///
    /// Fails with a validation error when the precision exceeds
    /// [`FIXED_PRECISION`], when an unsigned value would be negative, or when
    /// the scaled value does not fit the raw integer type.
    pub fn new(value: Decimal, precision: u8) -> ModelResult<Self> {
        check_precision(precision)?;
        let out_of_range = || ModelError::OutOfRange {
            value: value.to_string(),
            precision,
        };

        let scaled = value
            .checked_mul(Decimal::from(POWERS_OF_TEN[usize::from(precision)]))
            .ok_or_else(out_of_range)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        if !R::SIGNED && scaled < Decimal::ZERO {
            return Err(ModelError::NegativeQuantity {
                value: value.to_string(),
            });
        }

        let raw = scaled
            .to_i128()
            .and_then(|wide| R::try_from(wide).ok())
            .ok_or_else(out_of_range)?;

        Ok(Self { raw, precision })
    }

    /// Create from an `f64`, going through [`Decimal`] so the stored raw is exact
    ///
    /// # Errors
    ///
    /// Fails for non-finite input and for everything [`FixedPoint::new`] rejects.
    pub fn from_f64(value: f64, precision: u8) -> ModelResult<Self> {
        let decimal = Decimal::try_from(value).map_err(|_| ModelError::OutOfRange {
            value: value.to_string(),
            precision,
        })?;
        Self::new(decimal, precision)
    }

    /// Create from an already-scaled raw integer
    ///
    /// # Errors
    ///
    /// Fails when `precision` exceeds [`FIXED_PRECISION`].
    pub fn from_raw(raw: R, precision: u8) -> ModelResult<Self> {
        check_precision(precision)?;
        Ok(Self { raw, precision })
    }

    /// Zero at the given precision
    ///
    /// # Errors
    ///
    /// Fails when `precision` exceeds [`FIXED_PRECISION`].
    pub fn zero(precision: u8) -> ModelResult<Self> {
        Self::from_raw(R::ZERO, precision)
    }

    /// Same precision, different raw value
    #[must_use]
    pub const fn with_raw(&self, raw: R) -> Self {
        Self {
            raw,
            precision: self.precision,
        }
    }

    /// Raw scaled integer
    #[must_use]
    pub const fn raw(&self) -> R {
        self.raw
    }

    /// Decimal precision
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// Exact decimal value
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        Decimal::from_i128_with_scale(self.raw.into(), u32::from(self.precision))
    }

    /// Approximate value as `f64`, for display and analytics only
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> f64 {
        let raw: i128 = self.raw.into();
        raw as f64 / POWERS_OF_TEN[usize::from(self.precision)] as f64
    }

    /// Check if the value is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.raw == R::ZERO
    }

    /// Check if the value is strictly positive
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.raw > R::ZERO
    }

    /// Sum as a new value
    ///
    /// # Errors
    ///
    /// [`ModelError::PrecisionMismatch`] or [`ModelError::Overflow`].
    pub fn checked_add(&self, rhs: &Self) -> ModelResult<Self> {
        self.check_same_precision(rhs)?;
        let raw = self
            .raw
            .checked_add(rhs.raw)
            .ok_or(ModelError::Overflow { op: "add" })?;
        Ok(self.with_raw(raw))
    }

    /// Difference as a new value
    ///
    /// # Errors
    ///
    /// [`ModelError::PrecisionMismatch`] or [`ModelError::Overflow`]. For
    /// quantities a negative result is an overflow.
    pub fn checked_sub(&self, rhs: &Self) -> ModelResult<Self> {
        self.check_same_precision(rhs)?;
        let raw = self
            .raw
            .checked_sub(rhs.raw)
            .ok_or(ModelError::Overflow { op: "sub" })?;
        Ok(self.with_raw(raw))
    }

    /// `self += rhs`, leaving `self` unchanged on error
    ///
    /// # Errors
    ///
    /// See [`FixedPoint::checked_add`].
    pub fn add_in_place(&mut self, rhs: &Self) -> ModelResult<()> {
        *self = self.checked_add(rhs)?;
        Ok(())
    }

    /// `self -= rhs`, leaving `self` unchanged on error
    ///
    /// # Errors
    ///
    /// See [`FixedPoint::checked_sub`].
    pub fn sub_in_place(&mut self, rhs: &Self) -> ModelResult<()> {
        *self = self.checked_sub(rhs)?;
        Ok(())
    }

    /// Fail unless both operands share a precision
    ///
    /// # Errors
    ///
    /// [`ModelError::PrecisionMismatch`].
    pub const fn check_same_precision(&self, other: &Self) -> ModelResult<()> {
        if self.precision != other.precision {
            return Err(ModelError::PrecisionMismatch {
                left: self.precision,
                right: other.precision,
            });
        }
        Ok(())
    }

    // Raw rescaled to FIXED_PRECISION; cannot overflow i128 for 64-bit raws.
    fn normalized(&self) -> i128 {
        let raw: i128 = self.raw.into();
        raw * i128::from(POWERS_OF_TEN[usize::from(FIXED_PRECISION - self.precision)])
    }
}

impl FixedPoint<i64> {
    /// Check if the price is below zero
    #[must_use]
    pub const fn is_negative(&self) -> bool {
        self.raw < 0
    }

    /// Exact midpoint `(a + b) / 2`
    ///
    /// The result carries one extra digit of precision so the half tick is
    /// kept. At [`FIXED_PRECISION`] the half tick truncates toward zero.
    ///
    /// # Errors
    ///
    /// [`ModelError::PrecisionMismatch`] or [`ModelError::Overflow`].
    pub fn midpoint(a: &Self, b: &Self) -> ModelResult<Self> {
        a.check_same_precision(b)?;
        let sum = i128::from(a.raw) + i128::from(b.raw);
        let (wide, precision) = if a.precision < FIXED_PRECISION {
            (sum * 5, a.precision + 1)
        } else {
            (sum / 2, a.precision)
        };
        let raw = i64::try_from(wide).map_err(|_| ModelError::Overflow { op: "midpoint" })?;
        Ok(Self { raw, precision })
    }
}

impl FixedPoint<u64> {
    /// Add raw units at this quantity's precision
    ///
    /// # Errors
    ///
    /// [`ModelError::Overflow`], leaving `self` unchanged.
    pub fn add_raw_in_place(&mut self, raw: u64) -> ModelResult<()> {
        self.raw = self
            .raw
            .checked_add(raw)
            .ok_or(ModelError::Overflow { op: "add" })?;
        Ok(())
    }

    /// Subtract raw units at this quantity's precision
    ///
    /// # Errors
    ///
    /// [`ModelError::Overflow`] when the result would be negative, leaving
    /// `self` unchanged.
    pub fn sub_raw_in_place(&mut self, raw: u64) -> ModelResult<()> {
        self.raw = self
            .raw
            .checked_sub(raw)
            .ok_or(ModelError::Overflow { op: "sub" })?;
        Ok(())
    }
}

impl<R: RawValue> PartialEq for FixedPoint<R> {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl<R: RawValue> Eq for FixedPoint<R> {}

impl<R: RawValue> PartialOrd for FixedPoint<R> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<R: RawValue> Ord for FixedPoint<R> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl<R: RawValue> Hash for FixedPoint<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl<R: RawValue> fmt::Display for FixedPoint<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_decimal(), f)
    }
}

impl<R: RawValue> FromStr for FixedPoint<R> {
    type Err = ModelError;

    /// Parse a decimal literal, taking the literal's scale as the precision
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| ModelError::Parse(format!("'{s}': {e}")))?;
        let precision = u8::try_from(value.scale()).unwrap_or(u8::MAX);
        Self::new(value, precision)
    }
}
