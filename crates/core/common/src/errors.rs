//! Error types for value construction and fixed-point arithmetic

use thiserror::Error;

/// Errors raised by the value model
///
/// Validation variants fail construction, so no value is produced. Arithmetic
/// variants fail a single operation and leave every operand untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Precision above the supported maximum
    #[error("Invalid precision: {precision} exceeds maximum {max}")]
    InvalidPrecision {
        /// Requested precision
        precision: u8,
        /// Maximum supported precision
        max: u8,
    },

    /// Quantity constructed from a negative value
    #[error("Quantity must be non-negative, was {value}")]
    NegativeQuantity {
        /// Offending value
        value: String,
    },

    /// Scaled value does not fit the raw integer type
    #[error("Value {value} out of range at precision {precision}")]
    OutOfRange {
        /// Offending value
        value: String,
        /// Target precision
        precision: u8,
    },

    /// Identifier failed validation
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Currency definition failed validation
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Text could not be parsed into a value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Arithmetic between values of different precision
    #[error("Precision mismatch: {left} != {right}")]
    PrecisionMismatch {
        /// Left operand precision
        left: u8,
        /// Right operand precision
        right: u8,
    },

    /// Arithmetic between money amounts of different currencies
    #[error("Currency mismatch: {left} != {right}")]
    CurrencyMismatch {
        /// Left operand currency code
        left: String,
        /// Right operand currency code
        right: String,
    },

    /// Raw integer overflow or underflow
    #[error("Arithmetic overflow in {op}")]
    Overflow {
        /// Operation that overflowed
        op: &'static str,
    },
}

impl ModelError {
    /// Whether this error was raised while constructing a value
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidPrecision { .. }
                | Self::NegativeQuantity { .. }
                | Self::OutOfRange { .. }
                | Self::InvalidIdentifier(_)
                | Self::InvalidCurrency(_)
                | Self::Parse(_)
        )
    }
}

/// Result alias for value model operations
pub type ModelResult<T> = Result<T, ModelError>;
