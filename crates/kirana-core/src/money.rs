//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Fixed-Point Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Ten-Thousandths                                  │
//! │    450.0000 is stored as 4_500_000                                      │
//! │    Every rounding step is explicit (half-up, four decimal places),     │
//! │    matching the DECIMAL(15,4) precision of the billing columns.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kirana_core::money::{Money, RateBps};
//!
//! // 65.00 in currency units
//! let price = Money::from_major(65);
//!
//! // 18% tax, half-up rounded to four decimals
//! let tax = price.apply_rate(RateBps::from_bps(1800));
//! assert_eq!(tax, Money::from_raw(117_000)); // 11.7000
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

/// Number of raw units per whole currency unit (four decimal places).
pub const MONEY_SCALE: i64 = 10_000;

/// Basis points per whole (10000 bps = 100%).
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value as an integer count of ten-thousandths of a currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and corrections
/// - **Four decimal places**: Billing amounts are rounded half-up to four
///   decimals at every step, so the smallest representable unit is 0.0001
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// The database stores these raw i64 values directly (INTEGER columns), so
/// the `sqlx` feature derives a transparent column type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from raw ten-thousandths.
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let price = Money::from_raw(4_500_000); // 450.0000
    /// assert_eq!(price.raw(), 4_500_000);
    /// ```
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        Money(raw)
    }

    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MONEY_SCALE)
    }

    /// Returns the raw value in ten-thousandths.
    #[inline]
    pub const fn raw(&self) -> i64 {
        self.0
    }

    /// Returns the whole-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MONEY_SCALE
    }

    /// Returns the fractional portion in ten-thousandths (always 0-9999).
    #[inline]
    pub const fn frac(&self) -> i64 {
        (self.0 % MONEY_SCALE).abs()
    }

    /// Zero money value.
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
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies by a quantity without rounding (exact).
    ///
    /// ## Example
    /// ```rust
    /// use kirana_core::money::Money;
    ///
    /// let unit_price = Money::from_major(65);
    /// assert_eq!(unit_price.times(3), Money::from_major(195));
    /// ```
    #[inline]
    pub const fn times(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage rate, rounding half-up to four decimal places.
    ///
    /// ## Half-Up Rounding
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  HALF-UP AT THE FOURTH DECIMAL                                      │
    /// │                                                                     │
    /// │  450.00 × 10%   = 45.0000         (exact)                          │
    /// │  195.00 × 18%   = 35.1000         (exact)                          │
    /// │  10.01  × 18%   =  1.80180        → 1.8018                         │
    /// │  0.0001 × 50%   =  0.00005        → 0.0001  (half rounds up)       │
    /// │                                                                     │
    /// │  Ties round away from zero, the behavior of DECIMAL columns and    │
    /// │  of ROUND_HALF_UP in most financial systems.                       │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math in i128 to avoid overflow on large carts:
    /// `(raw × bps ± 5000) / 10000`
    pub fn apply_rate(&self, rate: RateBps) -> Money {
        Money(round_half_up(self.0 as i128 * rate.bps() as i128, BPS_SCALE))
    }

    /// Applies a rate to this value multiplied by a quantity, in one rounding
    /// step.
    ///
    /// Used for per-line discount amounts, which are specified as
    /// `unit_price × rate × quantity` rounded once.
    pub fn apply_rate_times(&self, rate: RateBps, qty: i64) -> Money {
        let scaled = self.0 as i128 * qty as i128 * rate.bps() as i128;
        Money(round_half_up(scaled, BPS_SCALE))
    }

    /// Parses a decimal string such as `"1000"`, `"450.00"` or `"0.0001"`.
    ///
    /// Fractional digits beyond the fourth are rounded half-up. Used for
    /// configuration values; never parse user-facing money through floats.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        let invalid = || ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: "must be a decimal number".to_string(),
        };

        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if digits.is_empty() {
            return Err(invalid());
        }

        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| invalid())?
        };

        // Take four fractional digits, remember the fifth for rounding.
        let mut frac: i64 = 0;
        for i in 0..4 {
            let d = frac_part
                .as_bytes()
                .get(i)
                .map(|&b| (b - b'0') as i64)
                .unwrap_or(0);
            frac = frac * 10 + d;
        }
        let round_up = frac_part
            .as_bytes()
            .get(4)
            .map(|&b| (b - b'0') >= 5)
            .unwrap_or(false);

        let mut raw = whole
            .checked_mul(MONEY_SCALE)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(invalid)?;
        if round_up {
            raw += 1;
        }

        Ok(Money(if negative { -raw } else { raw }))
    }
}

/// Rounds `numer / denom` half-up (ties away from zero).
///
/// `denom` must be positive.
fn round_half_up(numer: i128, denom: i128) -> i64 {
    let half = denom / 2;
    let rounded = if numer >= 0 {
        (numer + half) / denom
    } else {
        (numer - half) / denom
    };
    rounded as i64
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money with four decimal places.
///
/// Receipt rendering formats to two decimals in the presentation layer;
/// this form is for logs and diagnostics.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:04}", sign, self.major().abs(), self.frac())
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse(s)
    }
}

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

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing an iterator of Money values (cart aggregation).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage rate in basis points (1 bps = 0.01%).
///
/// ## Why Basis Points?
/// 1800 bps = 18.00% (GST), 500 bps = 5.00% order discount.
/// Integer rates keep every calculation exact until the single explicit
/// rounding step in [`Money::apply_rate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct RateBps(u32);

impl RateBps {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        RateBps(bps)
    }

    /// Creates a rate from whole percent (10 => 10.00%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        RateBps(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage, for display only.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        RateBps(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RateBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_major_and_parts() {
        let m = Money::from_major(450);
        assert_eq!(m.raw(), 4_500_000);
        assert_eq!(m.major(), 450);
        assert_eq!(m.frac(), 0);

        let m = Money::from_raw(651_234);
        assert_eq!(m.major(), 65);
        assert_eq!(m.frac(), 1234);
    }

    #[test]
    fn display_four_decimals() {
        assert_eq!(Money::from_raw(4_779_000).to_string(), "477.9000");
        assert_eq!(Money::from_raw(-55_000).to_string(), "-5.5000");
        assert_eq!(Money::zero().to_string(), "0.0000");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from_major(10);
        let b = Money::from_raw(55_000); // 5.5000

        assert_eq!((a + b).raw(), 155_000);
        assert_eq!((a - b).raw(), 45_000);
        assert_eq!((b * 3).raw(), 165_000);

        let sum: Money = [a, b, b].into_iter().sum();
        assert_eq!(sum.raw(), 210_000);
    }

    #[test]
    fn apply_rate_exact() {
        // 450.00 at 10% = 45.0000
        let discount = Money::from_major(450).apply_rate(RateBps::from_percent(10));
        assert_eq!(discount, Money::from_major(45));

        // 195.00 at 18% = 35.1000
        let tax = Money::from_major(195).apply_rate(RateBps::from_bps(1800));
        assert_eq!(tax.raw(), 351_000);
    }

    #[test]
    fn apply_rate_rounds_half_up() {
        // 0.0001 at 50% = 0.00005 -> rounds up to 0.0001
        let m = Money::from_raw(1).apply_rate(RateBps::from_bps(5000));
        assert_eq!(m.raw(), 1);

        // 0.0001 at 49.99% = 0.00004999 -> rounds down to 0.0000
        let m = Money::from_raw(1).apply_rate(RateBps::from_bps(4999));
        assert_eq!(m.raw(), 0);

        // Negative amounts round away from zero
        let m = Money::from_raw(-1).apply_rate(RateBps::from_bps(5000));
        assert_eq!(m.raw(), -1);
    }

    #[test]
    fn apply_rate_times_single_rounding() {
        // 0.0003 × 33.33% × 7 = 0.00069993 -> 0.0007 in one step
        let m = Money::from_raw(3).apply_rate_times(RateBps::from_bps(3333), 7);
        assert_eq!(m.raw(), 7);
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!(Money::parse("1000").unwrap(), Money::from_major(1000));
        assert_eq!(Money::parse("450.00").unwrap(), Money::from_major(450));
        assert_eq!(Money::parse("0.0001").unwrap(), Money::from_raw(1));
        assert_eq!(Money::parse("-5.50").unwrap(), Money::from_raw(-55_000));
        // fifth decimal digit rounds half-up
        assert_eq!(Money::parse("0.00005").unwrap(), Money::from_raw(1));
        assert_eq!(Money::parse("0.00004").unwrap(), Money::from_raw(0));

        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("1.2.3").is_err());
        assert!(Money::parse("").is_err());
    }

    #[test]
    fn rate_display() {
        assert_eq!(RateBps::from_bps(1800).to_string(), "18.00%");
        assert_eq!(RateBps::from_bps(825).to_string(), "8.25%");
        assert!((RateBps::from_percent(5).percentage() - 5.0).abs() < f64::EPSILON);
    }
}
