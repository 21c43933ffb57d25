//! Exact fixed-point money.
//!
//! All monetary values are [`Decimal`]s carried at two fractional digits. Binary floating point
//! never enters the arithmetic, so any sequence of credits and debits is exact.

use core::fmt;

use rust_decimal::Decimal;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of fractional digits carried by every monetary value.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a ledger column can hold, `NUMERIC(14, 2)`.
pub const MONEY_MAX: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, MONEY_SCALE);

/// Errors returned when constructing monetary values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The value must be strictly positive.
    #[error("amount must be greater than zero, got {0}")]
    NotPositive(Decimal),

    /// The value must not be negative.
    #[error("balance must not be negative, got {0}")]
    Negative(Decimal),

    /// The value has more fractional digits than the currency allows.
    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),

    /// The value exceeds [`MONEY_MAX`].
    #[error("amount {0} exceeds the ledger maximum")]
    TooLarge(Decimal),

    /// The result does not fit in the decimal range.
    #[error("amount overflow")]
    Overflow,
}

/// A strictly positive monetary amount, such as an offer price or a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "Decimal", into = "Decimal"))]
pub struct Amount(Decimal);

/// A non-negative account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(try_from = "Decimal", into = "Decimal"))]
pub struct Balance(Decimal);

fn to_money_scale(value: Decimal) -> Result<Decimal, MoneyError> {
    if value.normalize().scale() > MONEY_SCALE {
        return Err(MoneyError::TooPrecise(value));
    }

    if value > MONEY_MAX {
        return Err(MoneyError::TooLarge(value));
    }

    let mut value = value;
    value.rescale(MONEY_SCALE);

    Ok(value)
}

impl Amount {
    /// Creates an amount, rejecting zero, negative and sub-cent values.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value <= Decimal::ZERO {
            return Err(MoneyError::NotPositive(value));
        }

        to_money_scale(value).map(Self)
    }

    /// Returns the underlying decimal.
    pub fn get(&self) -> Decimal {
        self.0
    }
}

impl Balance {
    /// The zero balance.
    pub const ZERO: Balance = Balance(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    /// Creates a balance, rejecting negative and sub-cent values.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO {
            return Err(MoneyError::Negative(value));
        }

        to_money_scale(value).map(Self)
    }

    /// Returns the underlying decimal.
    pub fn get(&self) -> Decimal {
        self.0
    }

    /// Adds `amount` to the balance.
    pub fn checked_add(self, amount: Amount) -> Result<Self, MoneyError> {
        let sum = self.0.checked_add(amount.0).ok_or(MoneyError::Overflow)?;

        if sum > MONEY_MAX {
            return Err(MoneyError::TooLarge(sum));
        }

        Ok(Self(sum))
    }

    /// Subtracts `amount` from the balance, or returns `None` when the balance would go negative.
    pub fn checked_sub(self, amount: Amount) -> Option<Self> {
        if amount.0 > self.0 {
            return None;
        }

        self.0.checked_sub(amount.0).map(Self)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(Amount(value): Amount) -> Self {
        value
    }
}

impl From<Balance> for Decimal {
    fn from(Balance(value): Balance) -> Self {
        value
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn amount_rejects_non_positive_and_sub_cent_values() {
        assert_eq!(Amount::new(Decimal::ZERO), Err(MoneyError::NotPositive(Decimal::ZERO)));
        assert_eq!(Amount::new(dec("-1")), Err(MoneyError::NotPositive(dec("-1"))));
        assert_eq!(Amount::new(dec("0.001")), Err(MoneyError::TooPrecise(dec("0.001"))));
        assert_eq!(Amount::new(dec("12.50")).unwrap().to_string(), "12.50");
    }

    #[test]
    fn trailing_zeros_do_not_count_as_precision() {
        assert_eq!(Amount::new(dec("7.1000")).unwrap().get(), dec("7.1"));
    }

    #[test]
    fn balance_subtraction_never_goes_negative() {
        let balance = Balance::new(dec("50")).unwrap();

        assert_eq!(balance.checked_sub(Amount::new(dec("100")).unwrap()), None);
        assert_eq!(
            balance.checked_sub(Amount::new(dec("50")).unwrap()),
            Some(Balance::ZERO)
        );
    }

    #[test]
    fn zero_balance_carries_two_decimal_places() {
        assert_eq!(Balance::ZERO.to_string(), "0.00");
        assert_eq!(Balance::ZERO, Balance::new(Decimal::ZERO).unwrap());
    }

    #[test]
    fn values_beyond_the_column_range_are_rejected() {
        assert_eq!(MONEY_MAX.to_string(), "999999999999.99");
        assert_eq!(Amount::new(MONEY_MAX).unwrap().get(), MONEY_MAX);
        assert_eq!(
            Amount::new(dec("1000000000000000")),
            Err(MoneyError::TooLarge(dec("1000000000000000")))
        );
        assert_eq!(
            Balance::new(dec("1000000000000")),
            Err(MoneyError::TooLarge(dec("1000000000000")))
        );

        let full = Balance::new(MONEY_MAX).unwrap();
        assert!(matches!(
            full.checked_add(Amount::new(dec("0.01")).unwrap()),
            Err(MoneyError::TooLarge(_))
        ));
    }
}
