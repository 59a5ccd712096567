//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A +50% surcharge on 10.01 UAH in floats = 15.015 (or 15.0149999…)     │
//! │    → rounds differently depending on the machine                        │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Kopiykas                                         │
//! │    1001 × 50 / 100 = 500.5 → 501 (round half away from zero)           │
//! │    Same answer on every machine, every time                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use aksi_pricing::money::Money;
//!
//! let price = Money::from_minor(2000); // 20.00 UAH
//!
//! let surcharge = price.percent_of(50);
//! assert_eq!(surcharge.minor(), 1000);
//!
//! let total = price + surcharge;
//! assert_eq!(total.minor(), 3000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::CURRENCY;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (kopiykas for UAH).
///
/// ## Design Decisions
/// - **i64 (signed)**: deltas from subtracting modifiers and discounts are
///   negative, and a composed final price may be negative too
/// - **Single field tuple struct**: serializes as a plain JSON number
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use aksi_pricing::money::Money;
    ///
    /// let price = Money::from_minor(12050);
    /// assert_eq!(price.minor(), 12050);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from major and minor units (hryvnias and kopiykas).
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `percent`% of this amount, rounded half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use aksi_pricing::money::Money;
    ///
    /// // 10.01 UAH × 50% = 5.005 → 5.01
    /// assert_eq!(Money::from_minor(1001).percent_of(50).minor(), 501);
    ///
    /// // Negative amounts round symmetrically
    /// assert_eq!(Money::from_minor(-1001).percent_of(50).minor(), -501);
    /// ```
    pub fn percent_of(&self, percent: i64) -> Money {
        self.mul_div_round(percent, 100)
    }

    /// Computes `self × numerator / denominator` with an i128 intermediate,
    /// rounding half away from zero. A zero denominator yields zero.
    ///
    /// ```rust
    /// use aksi_pricing::money::Money;
    ///
    /// // 1000 × 100 / 300 = 333.33… → 333
    /// assert_eq!(Money::from_minor(1000).mul_div_round(100, 300).minor(), 333);
    /// ```
    pub fn mul_div_round(&self, numerator: i64, denominator: i64) -> Money {
        if denominator == 0 {
            return Money::zero();
        }
        let product = self.0 as i128 * numerator as i128;
        Money(saturate(round_half_away(product, denominator as i128)))
    }
}

/// Integer division rounding half away from zero.
pub(crate) fn round_half_away(numerator: i128, denominator: i128) -> i128 {
    let negative = (numerator < 0) != (denominator < 0);
    let n = numerator.unsigned_abs();
    let d = denominator.unsigned_abs();
    let q = (n + d / 2) / d;
    // u128 -> i128: q <= |numerator| which always fits
    let q = q as i128;
    if negative {
        -q
    } else {
        q
    }
}

fn saturate(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value < 0 { i64::MIN } else { i64::MAX })
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money as `"123.45 UAH"`. Frontends do their own localized formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} {}",
            sign,
            self.major().abs(),
            self.minor_part(),
            CURRENCY
        )
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        assert_eq!(Money::from_major_minor(10, 99).minor(), 1099);
        assert_eq!(Money::from_major_minor(-5, 50).minor(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99 UAH");
        assert_eq!(Money::from_minor(500).to_string(), "5.00 UAH");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50 UAH");
        assert_eq!(Money::zero().to_string(), "0.00 UAH");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((-a).minor(), -1000);
        assert_eq!(a.multiply_quantity(3).minor(), 3000);
    }

    #[test]
    fn test_percent_rounding_half_away_from_zero() {
        assert_eq!(Money::from_minor(1000).percent_of(10).minor(), 100);
        assert_eq!(Money::from_minor(1001).percent_of(50).minor(), 501);
        assert_eq!(Money::from_minor(1003).percent_of(50).minor(), 502);
        assert_eq!(Money::from_minor(-1001).percent_of(50).minor(), -501);
        assert_eq!(Money::from_minor(999).percent_of(0).minor(), 0);
    }

    #[test]
    fn test_mul_div_round() {
        assert_eq!(Money::from_minor(1000).mul_div_round(100, 200).minor(), 500);
        assert_eq!(Money::from_minor(1000).mul_div_round(100, 300).minor(), 333);
        assert_eq!(Money::from_minor(2000).mul_div_round(100, 300).minor(), 667);
        assert_eq!(Money::from_minor(1000).mul_div_round(1, 0).minor(), 0);
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        let big = Money::from_minor(i64::MAX / 2);
        // i128 intermediate: no panic, exact result
        assert_eq!(big.percent_of(100).minor(), i64::MAX / 2);
        // Saturates instead of wrapping
        assert_eq!(big.percent_of(1000).minor(), i64::MAX);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_minor(100).is_positive());
        assert!(Money::from_minor(-100).is_negative());
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, -50].into_iter().map(Money::from_minor).sum();
        assert_eq!(total.minor(), 300);
    }
}
