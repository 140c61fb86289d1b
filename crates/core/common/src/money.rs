//! Currencies and currency-tagged money amounts

use crate::errors::{ModelError, ModelResult};
use crate::fixed::{FixedPoint, check_precision};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Currency classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurrencyType {
    /// Crypto asset
    Crypto,
    /// Fiat currency
    Fiat,
}

/// Currency definition
///
/// Cloning is cheap: code and name are shared, reference-counted strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    code: Arc<str>,
    precision: u8,
    iso4217: u16,
    name: Arc<str>,
    currency_type: CurrencyType,
}

impl Currency {
    /// Create a new currency
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidCurrency`] for an empty or non-alphanumeric code,
    /// [`ModelError::InvalidPrecision`] above 9 decimals.
    pub fn new(
        code: &str,
        precision: u8,
        iso4217: u16,
        name: &str,
        currency_type: CurrencyType,
    ) -> ModelResult<Self> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ModelError::InvalidCurrency(format!("code '{code}'")));
        }
        check_precision(precision)?;
        Ok(Self {
            code: Arc::from(code),
            precision,
            iso4217,
            name: Arc::from(name),
            currency_type,
        })
    }

    /// Currency code, e.g. `USD`
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Minor-unit precision
    #[must_use]
    pub const fn precision(&self) -> u8 {
        self.precision
    }

    /// ISO 4217 numeric code (0 for most crypto assets)
    #[must_use]
    pub const fn iso4217(&self) -> u16 {
        self.iso4217
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Crypto or fiat
    #[must_use]
    pub const fn currency_type(&self) -> CurrencyType {
        self.currency_type
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Signed amount in a specific currency, at the currency's precision
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyParts")]
pub struct Money {
    amount: FixedPoint<i64>,
    currency: Currency,
}

#[derive(Deserialize)]
struct MoneyParts {
    amount: FixedPoint<i64>,
    currency: Currency,
}

impl TryFrom<MoneyParts> for Money {
    type Error = ModelError;

    fn try_from(parts: MoneyParts) -> Result<Self, Self::Error> {
        if parts.amount.precision() != parts.currency.precision {
            return Err(ModelError::PrecisionMismatch {
                left: parts.amount.precision(),
                right: parts.currency.precision,
            });
        }
        Ok(Self {
            amount: parts.amount,
            currency: parts.currency,
        })
    }
}

impl Money {
    /// Create from a decimal amount
    ///
    /// # Errors
    ///
    /// Validation errors from [`FixedPoint::new`].
    pub fn new(amount: Decimal, currency: Currency) -> ModelResult<Self> {
        let amount = FixedPoint::new(amount, currency.precision)?;
        Ok(Self { amount, currency })
    }

    /// Create from an already-scaled raw amount
    ///
    /// # Errors
    ///
    /// Validation errors from [`FixedPoint::from_raw`].
    pub fn from_raw(raw: i64, currency: Currency) -> ModelResult<Self> {
        let amount = FixedPoint::from_raw(raw, currency.precision)?;
        Ok(Self { amount, currency })
    }

    /// Raw scaled amount
    #[must_use]
    pub const fn raw(&self) -> i64 {
        self.amount.raw()
    }

    /// Currency of this amount
    #[must_use]
    pub const fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Exact decimal amount
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.amount.as_decimal()
    }

    /// Approximate amount as `f64`
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.amount.as_f64()
    }

    /// `self += rhs`, leaving `self` unchanged on error
    ///
    /// # Errors
    ///
    /// [`ModelError::CurrencyMismatch`] or [`ModelError::Overflow`].
    pub fn add_in_place(&mut self, rhs: &Self) -> ModelResult<()> {
        self.check_same_currency(rhs)?;
        self.amount.add_in_place(&rhs.amount)
    }

    /// `self -= rhs`, leaving `self` unchanged on error
    ///
    /// # Errors
    ///
    /// [`ModelError::CurrencyMismatch`] or [`ModelError::Overflow`].
    pub fn sub_in_place(&mut self, rhs: &Self) -> ModelResult<()> {
        self.check_same_currency(rhs)?;
        self.amount.sub_in_place(&rhs.amount)
    }

    fn check_same_currency(&self, other: &Self) -> ModelResult<()> {
        if self.currency != other.currency {
            return Err(ModelError::CurrencyMismatch {
                left: self.currency.code().to_string(),
                right: other.currency.code().to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn usd() -> Currency {
        Currency::new("USD", 2, 840, "United States dollar", CurrencyType::Fiat).unwrap()
    }

    fn btc() -> Currency {
        Currency::new("BTC", 8, 0, "Bitcoin", CurrencyType::Crypto).unwrap()
    }

    #[test]
    fn test_currency_new() {
        let aud = Currency::new("AUD", 8, 36, "Australian dollar", CurrencyType::Fiat).unwrap();
        assert_eq!(aud.code(), "AUD");
        assert_eq!(aud.precision(), 8);
        assert_eq!(aud.iso4217(), 36);
        assert_eq!(aud.name(), "Australian dollar");
        assert_eq!(aud.currency_type(), CurrencyType::Fiat);
    }

    #[test]
    fn test_currency_validation() {
        assert!(Currency::new("", 2, 0, "Empty", CurrencyType::Fiat).is_err());
        assert!(Currency::new("US D", 2, 0, "Space", CurrencyType::Fiat).is_err());
        assert!(matches!(
            Currency::new("XYZ", 12, 0, "Too precise", CurrencyType::Crypto),
            Err(ModelError::InvalidPrecision { .. })
        ));
    }

    #[test]
    fn test_money_uses_currency_precision() {
        let m = Money::new(Decimal::from_str("12.345").unwrap(), usd()).unwrap();
        assert_eq!(m.raw(), 1_235);
        assert_eq!(m.to_string(), "12.35 USD");
    }

    #[test]
    fn test_money_arithmetic() {
        let mut a = Money::from_raw(1_000, usd()).unwrap();
        let b = Money::from_raw(250, usd()).unwrap();
        a.add_in_place(&b).unwrap();
        assert_eq!(a.raw(), 1_250);
        a.sub_in_place(&b).unwrap();
        a.sub_in_place(&b).unwrap();
        assert_eq!(a.raw(), 750);
        assert_eq!(a.as_decimal(), Decimal::from_str("7.50").unwrap());
    }

    #[test]
    fn test_currency_mismatch_leaves_operands() {
        let mut a = Money::from_raw(1_000, usd()).unwrap();
        let b = Money::from_raw(1_000, btc()).unwrap();
        let err = a.add_in_place(&b).unwrap_err();
        assert_eq!(
            err,
            ModelError::CurrencyMismatch {
                left: "USD".to_string(),
                right: "BTC".to_string()
            }
        );
        assert_eq!(a.raw(), 1_000);
    }

    #[test]
    fn test_money_overflow() {
        let mut a = Money::from_raw(i64::MIN, usd()).unwrap();
        let b = Money::from_raw(1, usd()).unwrap();
        assert!(matches!(
            a.sub_in_place(&b),
            Err(ModelError::Overflow { .. })
        ));
        assert_eq!(a.raw(), i64::MIN);
    }
}
