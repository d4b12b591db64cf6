//! Amount type for handling monetary values with optional dollar signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a dollar sign and thousands separators. The dashboard uses it both to
//! read amounts typed by a person and to render the summary cards.

use rust_decimal::Decimal;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents a dollar amount. It is always written as `$1,234.56` or `-$1,234.56`.
///
/// # Examples
///
/// ```
/// # use kpi_dashboard::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("1500").unwrap();
/// assert_eq!(amount.to_string(), "$1,500.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parses `$1,000.00`, `-$5.25`, `1000`, `1.5e3` and so on. Unlike a spreadsheet cell, an
    /// empty string is not zero, it is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let unsigned = match trimmed.strip_prefix('-') {
            Some(rest) => format!("-{}", rest.strip_prefix('$').unwrap_or(rest)),
            None => trimmed.strip_prefix('$').unwrap_or(trimmed).to_string(),
        };
        let digits = unsigned.replace(',', "");
        Decimal::from_str(&digits)
            .or_else(|e| Decimal::from_scientific(&digits).map_err(|_| e))
            .map(Amount)
            .map_err(AmountError)
    }
}

impl Display for Amount {
    /// Rounds to cents and groups the whole dollars in threes. The decimal is formatted directly
    /// so that totals too large for an `f64` keep every digit.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut cents = self.0.round_dp(2);
        cents.rescale(2);
        let sign = if cents.is_sign_negative() && !cents.is_zero() {
            "-"
        } else {
            ""
        };
        let text = cents.abs().to_string();
        let (dollars, fraction) = text.split_once('.').unwrap_or((&text, "00"));
        write!(f, "{sign}${}.{fraction}", group_thousands(dollars))
    }
}

/// Inserts a comma between every three digits, counting from the right.
fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
