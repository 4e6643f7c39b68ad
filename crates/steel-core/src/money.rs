//! # Money Module
//!
//! Provides `Money` for monetary values and `Rate` for percentages.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  An invoice whose items sum to 250.00 must have subtotal 250.00,       │
//! │  and an invoice whose payments sum to 300.00 must be exactly "paid".   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Line totals are rounded ONCE (quantity × unit price), then every    │
//! │    sum, discount and tax is integer arithmetic.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use steel_core::money::Money;
//!
//! let price = Money::from_cents(12_500);      // 125.00 per meter
//! let line = price.multiply_quantity(2.5);     // 2.5 m
//! assert_eq!(line.cents(), 31_250);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  InvoiceItem.unit_price × quantity ──► InvoiceItem.total_price         │
/// │                                              │                          │
/// │                                     Σ ──► Invoice.subtotal             │
/// │                                              │                          │
/// │                  subtotal - discount + tax ──► Invoice.total            │
/// │                                              │                          │
/// │            Σ confirmed InvoicePayment.amount ──► Invoice.paid           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the value in major units as a float.
    ///
    /// Only for snapshots and display; never feed the result back into
    /// arithmetic.
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
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
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a rate to this amount, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::money::{Money, Rate};
    ///
    /// let taxable = Money::from_cents(1000);
    /// let tax = taxable.percentage(Rate::from_bps(825)); // 8.25%
    /// assert_eq!(tax.cents(), 83);
    /// ```
    pub fn percentage(&self, rate: Rate) -> Money {
        // i128 keeps large invoices from overflowing
        let scaled = self.0 as i128 * rate.bps() as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        Money::from_cents(rounded as i64)
    }

    /// Multiplies a unit price by a fractional quantity.
    ///
    /// Steel is sold by the meter or kilogram, so quantities are real numbers.
    /// The product is rounded to the nearest cent exactly once here.
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(333);
    /// assert_eq!(unit_price.multiply_quantity(1.5).cents(), 500);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: f64) -> Self {
        Money((self.0 as f64 * qty).round() as i64)
    }

    /// Like [`Money::multiply_quantity`], but `None` when the product is not
    /// finite or does not fit in `i64` (the plain cast would saturate).
    ///
    /// ## Example
    /// ```rust
    /// use steel_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(333).checked_multiply_quantity(1.5), Some(Money::from_cents(500)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_multiply_quantity(2.0), None);
    /// ```
    pub fn checked_multiply_quantity(&self, qty: f64) -> Option<Self> {
        let product = (self.0 as f64 * qty).round();
        // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound
        let fits = product.is_finite() && product >= i64::MIN as f64 && product < i64::MAX as f64;
        fits.then(|| Money(product as i64))
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// `None` on overflow.
    #[inline]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `major.minor` rendering, used on printed receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
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

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000.
/// Clients send `discount_percentage: 7.5`, we store `750`.
/// Both invoice discount and invoice tax use this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(i64);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a decimal percentage (`7.5` → 750 bps).
    ///
    /// Callers validate the range first; see
    /// [`validate_percentage`](crate::validation::validate_percentage).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as i64)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn as_percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
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
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_percentage_basic() {
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage(Rate::from_bps(1000)).cents(), 100);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        // 10.00 at 8.25% = 0.825 → 0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.percentage(Rate::from_bps(825)).cents(), 83);
    }

    #[test]
    fn test_multiply_fractional_quantity() {
        let unit_price = Money::from_cents(12_500);
        assert_eq!(unit_price.multiply_quantity(2.5).cents(), 31_250);
        assert_eq!(unit_price.multiply_quantity(1.0).cents(), 12_500);

        // 0.333 × 1.00 = 0.333 → 0.33
        assert_eq!(Money::from_cents(100).multiply_quantity(0.333).cents(), 33);
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let near_max = Money::from_cents(i64::MAX / 2 + 1);
        assert_eq!(near_max.checked_add(near_max), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(100).checked_add(Money::from_cents(50)),
            Some(Money::from_cents(150))
        );

        assert_eq!(near_max.checked_multiply_quantity(2.0), None);
        assert_eq!(Money::from_cents(1).checked_multiply_quantity(f64::INFINITY), None);
        assert_eq!(Money::from_cents(1).checked_multiply_quantity(f64::NAN), None);
        assert_eq!(
            Money::from_cents(12_500).checked_multiply_quantity(2.5),
            Some(Money::from_cents(31_250))
        );
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(10.0).bps(), 1000);
        assert_eq!(Rate::from_percentage(7.5).bps(), 750);
        assert_eq!(Rate::from_percentage(0.125).bps(), 13);
        assert!((Rate::from_bps(750).as_percentage() - 7.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_major() {
        assert!((Money::from_cents(25_000).to_major() - 250.0).abs() < f64::EPSILON);
        assert!((Money::from_cents(5).to_major() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }
}
