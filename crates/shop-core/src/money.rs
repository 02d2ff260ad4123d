//! # Money Module
//!
//! The `Money` type for every price, balance and wage in a shop.
//!
//! ## Whole Units Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The in-game currency has no minor unit.                                │
//! │                                                                         │
//! │    basePrice 100, discount 25%  →  75                                  │
//! │    basePrice 99,  discount 10%  →  89   (89.1 floored)                 │
//! │                                                                         │
//! │  Discounts always floor, so the customer never pays a fraction and     │
//! │  the result never exceeds the undiscounted price.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shop_core::money::Money;
//!
//! let price = Money::from_units(100);
//! assert_eq!(price.apply_discount_percent(25).units(), 75);
//! assert_eq!(Money::from_units(1_234_567).to_string(), "$1.234.567");
//! ```

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// Serializes as a bare integer. Deserialization is lenient: integers,
/// floats (truncated toward zero) and numeric strings are accepted, anything
/// else becomes zero, so a malformed push never leaves a price non-numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Creates a Money value from a coerced JSON number.
    ///
    /// Non-finite input yields zero; fractions are truncated toward zero.
    pub fn from_number(value: f64) -> Self {
        if value.is_finite() {
            Money(value.trunc() as i64)
        } else {
            Money(0)
        }
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
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

    /// Clamps negative values to zero.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage discount, flooring the result.
    ///
    /// `percent` is clamped to `0..=100`. The result is never negative for a
    /// non-negative amount and never exceeds the amount itself.
    ///
    /// ## Example
    /// ```rust
    /// use shop_core::money::Money;
    ///
    /// assert_eq!(Money::from_units(100).apply_discount_percent(10).units(), 90);
    /// assert_eq!(Money::from_units(99).apply_discount_percent(10).units(), 89);
    /// assert_eq!(Money::from_units(5).apply_discount_percent(100).units(), 0);
    /// ```
    pub fn apply_discount_percent(&self, percent: i64) -> Money {
        let percent = percent.clamp(0, 100) as i128;
        // i128 keeps large balances from overflowing before the division
        let scaled = self.0 as i128 * (100 - percent);
        Money(scaled.div_euclid(100) as i64)
    }

    /// Formats with `.` thousands separators, the way the shop UI shows money.
    fn grouped_digits(&self) -> String {
        let digits = self.0.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(ch);
        }
        out
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$1.234.567`, with a leading `-` for negative values.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}", sign, self.grouped_digits())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Lenient Deserialization
// =============================================================================

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        Ok(Money(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        Ok(Money(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        Ok(Money::from_number(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Ok(v.trim().parse::<f64>().map(Money::from_number).unwrap_or_default())
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_none<E: de::Error>(self) -> Result<Money, E> {
        Ok(Money::zero())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_units(0).to_string(), "$0");
        assert_eq!(Money::from_units(999).to_string(), "$999");
        assert_eq!(Money::from_units(1_000).to_string(), "$1.000");
        assert_eq!(Money::from_units(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Money::from_units(-25_000).to_string(), "-$25.000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_units(1000);
        let b = Money::from_units(500);

        assert_eq!((a + b).units(), 1500);
        assert_eq!((a - b).units(), 500);
        assert_eq!((a * 3).units(), 3000);
        assert_eq!(a.multiply_quantity(2).units(), 2000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.units(), 2000);
    }

    #[test]
    fn test_discount_floors() {
        assert_eq!(Money::from_units(100).apply_discount_percent(25).units(), 75);
        assert_eq!(Money::from_units(99).apply_discount_percent(10).units(), 89);
        assert_eq!(Money::from_units(1).apply_discount_percent(50).units(), 0);
    }

    #[test]
    fn test_discount_percent_is_clamped() {
        assert_eq!(Money::from_units(80).apply_discount_percent(150).units(), 0);
        assert_eq!(Money::from_units(80).apply_discount_percent(-20).units(), 80);
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(Money::from_units(-5).non_negative(), Money::zero());
        assert_eq!(Money::from_units(5).non_negative().units(), 5);
    }

    #[test]
    fn test_lenient_deserialize() {
        let parsed: Vec<Money> =
            serde_json::from_str(r#"[120, 99.9, "45", "abc", null, true]"#).unwrap();
        let units: Vec<i64> = parsed.iter().map(Money::units).collect();
        assert_eq!(units, vec![120, 99, 45, 0, 0, 0]);
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_units(250)).unwrap();
        assert_eq!(json, "250");
    }
}
