//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//! The ledger is single-currency, so `Money` carries no currency code; every
//! amount is held at currency precision (two decimal places).

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places every amount is held at
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// Display symbol for the ledger currency
pub const CURRENCY_SYMBOL: &str = "₹";

/// Largest magnitude a single entry may carry, in minor units
/// (999,999,999,999.99, the `NUMERIC(14, 2)` column limit)
pub const MAX_ENTRY_MINOR: i64 = 99_999_999_999_999;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A monetary amount at currency precision
///
/// Construction always rounds to two decimal places, so arithmetic between
/// `Money` values is exact and never accumulates sub-cent residue. Values
/// within a few orders of magnitude of `Decimal::MAX` have no room for the
/// extra digits and stay at their original scale; entry amounts are capped
/// well below that by [`Money::is_within_entry_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Money {
    amount: Decimal,
}

impl Money {
    /// Creates a new Money value, rounding to currency precision
    pub fn new(amount: Decimal) -> Self {
        let mut amount = amount.round_dp(CURRENCY_DECIMAL_PLACES);
        amount.rescale(CURRENCY_DECIMAL_PLACES);
        Self { amount }
    }

    /// Creates Money from an integer amount in minor units (paise/cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self::new(Decimal::new(minor_units, CURRENCY_DECIMAL_PLACES))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Largest magnitude accepted for a single balance movement
    pub fn max_entry() -> Self {
        Self::from_minor(MAX_ENTRY_MINOR)
    }

    /// True if the magnitude fits a single ledger entry
    pub fn is_within_entry_limit(&self) -> bool {
        self.amount.abs() <= Self::max_entry().amount
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self::new(self.amount.abs())
    }

    /// Checked addition that reports overflow instead of panicking
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.amount
            .checked_add(other.amount)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction that reports overflow instead of panicking
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.amount
            .checked_sub(other.amount)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses user input such as `"12.5"` or `" 100.00 "`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::InvalidAmount("amount is required".to_string()));
        }
        Decimal::from_str(trimmed)
            .map(Self::new)
            .map_err(|_| MoneyError::InvalidAmount(format!("'{}' is not a number", trimmed)))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.dp$}",
            CURRENCY_SYMBOL,
            self.amount,
            dp = CURRENCY_DECIMAL_PLACES as usize
        )
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.amount, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self::new)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.amount + other.amount)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.amount - other.amount)
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.amount)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
