//! # Money Module
//!
//! Provides the `Money` type used for every amount in the cash engine:
//! opening balances, movements, counted cash and reconciliation differences.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM AT THE DRAWER                               │
//! │                                                                         │
//! │  Summing a day of movements as f64:                                     │
//! │    1000.10 + 0.20 - 1000.30 = 1.1368683772161603e-13  ❌                 │
//! │                                                                         │
//! │  The drawer then looks "almost matched" and an epsilon has to paper     │
//! │  over the noise at every aggregation layer.                             │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    100010 + 20 - 100030 = 0 cents, exactly                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cashdesk_core::money::Money;
//!
//! let opening = Money::from_cents(100_000);          // $1000.00
//! let sale: Money = "500.00".parse().unwrap();       // $500.00
//! let expected = opening + sale - Money::from_major_minor(200, 0).unwrap();
//! assert_eq!(expected.cents(), 130_000);
//!
//! // Ledger folds use the checked forms and never wrap
//! assert!(Money::from_cents(i64::MAX).checked_add(sale).is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: expected balances can legitimately go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as cents**: the frontend formats for display
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Session.initial_amount ──┐                                             │
/// │                           ├──► BalanceCalculator ──► expected_cash      │
/// │  CashMovement.amount ─────┘                              │              │
/// │                                                          ▼              │
/// │  counted_cash (operator) ────────────────────────► Reconciliation       │
/// │                                                          │              │
/// │                                                          ▼              │
/// │                                              FleetSummary totals        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use cashdesk_core::money::Money;
    ///
    /// let amount = Money::from_cents(1099); // $10.99
    /// assert_eq!(amount.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// Returns `None` if the result does not fit in i64 cents.
    ///
    /// ## Example
    /// ```rust
    /// use cashdesk_core::money::Money;
    ///
    /// assert_eq!(Money::from_major_minor(10, 99).unwrap().cents(), 1099);
    /// assert_eq!(Money::from_major_minor(-150, 0).unwrap().cents(), -15000);
    /// assert_eq!(Money::from_major_minor(-5, 50).unwrap().cents(), -550);
    /// assert!(Money::from_major_minor(i64::MAX, 0).is_none());
    /// ```
    ///
    /// ## Note
    /// For negative amounts only the major unit carries the sign.
    pub fn from_major_minor(major: i64, minor: i64) -> Option<Self> {
        let scaled = major.checked_mul(100)?;
        let cents = if major < 0 {
            scaled.checked_sub(minor)?
        } else {
            scaled.checked_add(minor)?
        };
        Some(Money(cents))
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    ///
    /// ## Example
    /// ```rust
    /// use cashdesk_core::money::Money;
    ///
    /// let deficit = Money::from_cents(-15000);
    /// assert_eq!(deficit.abs().cents(), 15000);
    /// ```
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Absolute value, clamped at `i64::MAX` cents.
    #[inline]
    pub const fn saturating_abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Addition that returns `None` instead of wrapping.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtraction that returns `None` instead of wrapping.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtraction clamped to the i64 range.
    #[inline]
    pub const fn saturating_sub(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a decimal string such as `"1300.00"`, `"-150.5"` or `"42"`.
///
/// ## Rules
/// - Optional leading `-` or `+`
/// - At most two fractional digits (no silent rounding of extra precision)
/// - `,` and `_` thousands separators are ignored
///
/// Operator input reaches the engine as text from the closing dialog; parsing
/// it here keeps binary floats out of the pipeline entirely.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let digits: String = digits.chars().filter(|c| *c != ',' && *c != '_').collect();

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits.as_str(), ""),
        };

        if major_str.is_empty() && minor_str.is_empty() {
            return Err(invalid("no digits"));
        }
        if minor_str.len() > 2 {
            return Err(invalid("at most two decimal places"));
        }
        if !major_str.chars().all(|c| c.is_ascii_digit())
            || !minor_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid("must be a decimal number"));
        }

        let major: i64 = if major_str.is_empty() {
            0
        } else {
            major_str.parse().map_err(|_| invalid("amount too large"))?
        };
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor_str.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$1300.00` / `-$150.00`.
///
/// ## Note
/// For logs and debugging. The frontend handles localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// Operators follow i64 semantics. Ledger folds use `checked_add` / `checked_sub`.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.dollars(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(130_000).to_string(), "$1300.00");
        assert_eq!(Money::from_cents(-15_000).to_string(), "-$150.00");
        assert_eq!(Money::from_cents(-5).to_string(), "-$0.05");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_parse_decimal_strings() {
        assert_eq!("1300.00".parse::<Money>().unwrap().cents(), 130_000);
        assert_eq!("1,300.5".parse::<Money>().unwrap().cents(), 130_050);
        assert_eq!("-150".parse::<Money>().unwrap().cents(), -15_000);
        assert_eq!("+0.01".parse::<Money>().unwrap().cents(), 1);
        assert_eq!(".75".parse::<Money>().unwrap().cents(), 75);
        assert_eq!(" 42 ".parse::<Money>().unwrap().cents(), 4200);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "".parse::<Money>(),
            Err(ValidationError::Required { .. })
        ));
        assert!("12.345".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((-a).cents(), -1000);

        let total: Money = [a, b, Money::from_cents(-200)].iter().sum();
        assert_eq!(total.cents(), 1300);
    }

    /// The exact sum that drifts under f64 is exact here.
    #[test]
    fn test_no_float_drift_across_many_movements() {
        let dime = Money::from_cents(10);
        let total: Money = std::iter::repeat(dime).take(1000).sum();
        assert_eq!(total, Money::from_major_minor(100, 0).unwrap());
    }

    #[test]
    fn test_checked_arithmetic() {
        let big = Money::from_cents(i64::MAX / 2 + 1);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(1_000).checked_sub(Money::from_cents(1_500)),
            Some(Money::from_cents(-500))
        );
        assert_eq!(
            Money::from_cents(i64::MIN).saturating_abs(),
            Money::from_cents(i64::MAX)
        );
        assert_eq!(
            Money::from_cents(i64::MIN).saturating_sub(Money::from_cents(1)),
            Money::from_cents(i64::MIN)
        );
        assert!(Money::from_major_minor(i64::MAX / 100 + 1, 0).is_none());
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs(), Money::from_cents(550));
    }
}
