//! Money type for representing currency amounts
//!
//! Internally stores amounts in cents (i64) to avoid floating-point precision
//! issues. Provides safe arithmetic operations and formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// Represents a monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use invoice_cli::models::Money;
    /// let amount = Money::from_cents(1050); // 10.50
    /// assert_eq!(amount.to_string(), "10.50");
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole units and cents
    pub const fn from_units_cents(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Get the whole units portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Get the cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Check if the amount is zero
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Check if the amount is positive
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a money amount from a string
    ///
    /// Accepts plain amounts ("10", "10.5", "-3.20") as well as rendered
    /// amounts carrying a currency symbol and thousands separators
    /// ("¥ 1,234.50", "$1,000"). Digits past the second decimal are truncated.
    ///
    /// ```
    /// use invoice_cli::models::Money;
    /// assert_eq!(Money::parse("¥ 1,234.50").unwrap(), Money::parse("1234.5").unwrap());
    /// ```
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let original = s;
        let s = s.trim();

        let (negative, s) = match s.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, s),
        };

        // Drop a leading currency symbol and the spacing after it
        let s = s.trim_start_matches(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','));
        let s = s.trim_end();
        let digits: String = s.chars().filter(|c| *c != ',').collect();

        if digits.is_empty() || digits.chars().any(|c| !(c.is_ascii_digit() || c == '.')) {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }

        let cents = match digits.split_once('.') {
            Some((units, fraction)) => {
                if fraction.contains('.') || (units.is_empty() && fraction.is_empty()) {
                    return Err(MoneyParseError::InvalidFormat(original.to_string()));
                }

                let units: i64 = if units.is_empty() {
                    0
                } else {
                    units
                        .parse()
                        .map_err(|_| MoneyParseError::InvalidFormat(original.to_string()))?
                };

                // Pad or truncate cents to 2 digits
                let cents: i64 = match fraction.len() {
                    0 => 0,
                    1 => fraction.parse::<i64>().unwrap_or(0) * 10,
                    _ => fraction[..2].parse().unwrap_or(0),
                };

                units
                    .checked_mul(100)
                    .and_then(|v| v.checked_add(cents))
                    .ok_or_else(|| MoneyParseError::InvalidFormat(original.to_string()))?
            }
            None => digits
                .parse::<i64>()
                .ok()
                .and_then(|v| v.checked_mul(100))
                .ok_or_else(|| MoneyParseError::InvalidFormat(original.to_string()))?,
        };

        Ok(Self(if negative { -cents } else { cents }))
    }

    /// Format with a currency symbol and thousands separators, e.g. `¥ 1,234.50`
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let grouped = group_thousands(self.units().unsigned_abs());
        if symbol.is_empty() {
            format!("{}{}.{:02}", sign, grouped, self.cents_part())
        } else {
            format!("{}{} {}.{:02}", sign, symbol, grouped, self.cents_part())
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

/// Plain decimal rendering without symbol or grouping (`1234.50`)
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

// Arithmetic saturates at the i64 cent range instead of overflowing

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
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
        Self(self.0.saturating_sub(other.0))
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.cents(), 1050);
        assert_eq!(m.units(), 10);
        assert_eq!(m.cents_part(), 50);
        assert_eq!(Money::from_units_cents(10, 50), m);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_format_with_symbol() {
        assert_eq!(Money::from_cents(123450).format_with_symbol("¥"), "¥ 1,234.50");
        assert_eq!(Money::from_cents(99).format_with_symbol("¥"), "¥ 0.99");
        assert_eq!(
            Money::from_cents(123456789).format_with_symbol("$"),
            "$ 1,234,567.89"
        );
        assert_eq!(Money::from_cents(100000).format_with_symbol(""), "1,000.00");
        assert_eq!(Money::from_cents(-250).format_with_symbol("¥"), "-¥ 2.50");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("-10.50").unwrap().cents(), -1050);
        assert_eq!(Money::parse("10").unwrap().cents(), 1000);
        assert_eq!(Money::parse("10.5").unwrap().cents(), 1050);
        assert_eq!(Money::parse("0.05").unwrap().cents(), 5);
        assert_eq!(Money::parse(".5").unwrap().cents(), 50);
        assert_eq!(Money::parse("12.345").unwrap().cents(), 1234);
    }

    #[test]
    fn test_parse_rendered_amounts() {
        assert_eq!(Money::parse("¥ 1,234.50").unwrap().cents(), 123450);
        assert_eq!(Money::parse("$1,000").unwrap().cents(), 100000);
        assert_eq!(Money::parse("  ¥0.99 ").unwrap().cents(), 99);
        assert_eq!(
            Money::parse("¥ 1,234.50").unwrap(),
            Money::parse("1234.5").unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Money::parse("").is_err());
        assert!(Money::parse("¥").is_err());
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("12x").is_err());
        assert!(Money::parse(".").is_err());
    }

    #[test]
    fn test_sum() {
        let total: Money = vec![Money::from_cents(100), Money::from_cents(250)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 350);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX);

        let total: Money = vec![huge, Money::from_cents(1), huge].into_iter().sum();
        assert_eq!(total, huge);

        let mut acc = huge;
        acc += Money::from_cents(500);
        assert_eq!(acc, huge);

        assert_eq!(
            Money::from_cents(i64::MIN) - Money::from_cents(1),
            Money::from_cents(i64::MIN)
        );
    }
}
