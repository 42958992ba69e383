//! Amount - Positive decimal wrapper for withdrawal amounts
//!
//! A withdrawal is never smaller than one currency unit.
//! This is enforced at the type level.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors that can occur when working with amounts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount must be positive: {0}")]
    NotPositive(Decimal),

    #[error("Amount is below the minimum of {minimum}: {value}")]
    BelowMinimum { value: Decimal, minimum: Decimal },
}

/// A withdrawal amount.
///
/// # Invariant
/// The inner value is always >= [`Amount::MINIMUM`]. This is enforced by the constructor.
///
/// # Example
/// ```
/// use cashout_core::Amount;
/// use rust_decimal::Decimal;
///
/// let amount = Amount::new(Decimal::new(100, 0)).unwrap();
/// assert_eq!(amount.value(), Decimal::new(100, 0));
///
/// // Zero and negative amounts are rejected
/// assert!(Amount::new(Decimal::ZERO).is_err());
/// assert!(Amount::new(Decimal::new(-100, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Smallest amount a withdrawal may carry
    pub const MINIMUM: Decimal = Decimal::ONE;

    /// Create a new Amount from a Decimal.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            Err(AmountError::NotPositive(value))
        } else if value < Self::MINIMUM {
            Err(AmountError::BelowMinimum {
                value,
                minimum: Self::MINIMUM,
            })
        } else {
            Ok(Self(value))
        }
    }

    /// Get the inner Decimal value
    #[inline]
    pub const fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

// Clients send and expect JSON numbers, not decimal strings.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}
