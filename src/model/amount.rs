//! Amount type for the positive monetary value of an expense.
//!
//! This module provides the `Amount` type which wraps `Decimal`, guarantees that the value is
//! strictly positive, and handles parsing values that may include a currency symbol and commas.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// The largest amount a single expense may have. Far below `Decimal::MAX`, so summing any
/// realistic number of amounts cannot overflow.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Currency symbols that may prefix an amount.
const CURRENCY_SYMBOLS: [&str; 2] = ["₹", "$"];

/// Represents the amount of a single expense. Always greater than zero and at most
/// [`MAX_AMOUNT`].
///
/// An `Amount` is written to the store as a plain number without a currency symbol, e.g. `100` or
/// `12.5`. Use [`money`] to format a value for display.
///
/// # Examples
///
/// ```
/// # use expense_log::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("₹1,250.50").unwrap();
/// assert_eq!(amount.to_string(), "1250.5");
/// assert!(Amount::from_str("0").is_err());
/// assert!(Amount::from_str("-5").is_err());
/// assert!(Amount::from_str("abc5").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Creates a new `Amount`, rejecting zero, negative and too-large values.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }
        if value > MAX_AMOUNT {
            return Err(AmountError::TooLarge(value));
        }
        Ok(Self(value.normalize()))
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// An error that can occur when parsing strings into `Amount` values.
#[derive(Debug)]
pub enum AmountError {
    /// The text is not a number.
    Invalid(rust_decimal::Error),
    /// The number is zero or negative.
    NotPositive(Decimal),
    /// The number is larger than `MAX_AMOUNT`.
    TooLarge(Decimal),
    /// Commas that are not thousands separators, e.g. `1,2,3`.
    BadSeparators(String),
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AmountError::Invalid(e) => write!(f, "not a valid amount: {e}"),
            AmountError::NotPositive(v) => write!(f, "amount must be positive, got {v}"),
            AmountError::TooLarge(v) => write!(f, "amount must be at most {MAX_AMOUNT}, got {v}"),
            AmountError::BadSeparators(s) => write!(f, "misplaced thousands separator in '{s}'"),
        }
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AmountError::Invalid(e) => Some(e),
            AmountError::NotPositive(_)
            | AmountError::TooLarge(_)
            | AmountError::BadSeparators(_) => None,
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Drop one leading currency symbol, e.g. "₹100" or "$100"
        let trimmed = s.trim();
        let trimmed = CURRENCY_SYMBOLS
            .iter()
            .find_map(|symbol| trimmed.strip_prefix(symbol))
            .unwrap_or(trimmed)
            .trim_start();

        let digits = strip_thousands(trimmed)?;
        let value = Decimal::from_str(&digits).map_err(AmountError::Invalid)?;
        Amount::new(value)
    }
}

/// Removes commas that separate groups of three digits in the integer part. Any other comma is
/// an error.
fn strip_thousands(s: &str) -> Result<String, AmountError> {
    if !s.contains(',') {
        return Ok(s.to_string());
    }
    let bad = || AmountError::BadSeparators(s.to_string());
    let (int, frac) = match s.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (s, None),
    };
    if frac.is_some_and(|f| f.contains(',')) {
        return Err(bad());
    }
    let mut groups = int.trim_start_matches(['-', '+']).split(',');
    let first = groups.next().unwrap_or_default();
    if first.is_empty() || first.len() > 3 || groups.any(|g| g.len() != 3) {
        return Err(bad());
    }
    Ok(s.replace(',', ""))
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

/// Formats `value` with the currency symbol, thousands separators and two decimals,
/// e.g. `₹1,234.50`.
pub fn money(value: Decimal, currency: &str) -> String {
    let (sign, num) = if value.is_sign_negative() && !value.is_zero() {
        ("-", value.abs())
    } else {
        ("", value)
    };
    format!(
        "{sign}{currency}{}",
        format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
    )
}

/// Formats `value` rounded to a whole number with the currency symbol, e.g. `₹130`.
/// Midpoints round to the even neighbour.
pub fn money_rounded(value: Decimal, currency: &str) -> String {
    format!("{currency}{}", value.round())
}
