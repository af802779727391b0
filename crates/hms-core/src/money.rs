//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  THE INTEGER CENTS PROBLEM                                              │
//! │    Distributor plan $499.99 with a 10% code → $49.999 off              │
//! │    Integer cents cannot hold the third decimal place                   │
//! │                                                                         │
//! │  OUR SOLUTION: 96-bit Decimal                                           │
//! │    499.99 × 0.10 = 49.999 exactly                                      │
//! │    Rounding to cents happens only when a figure is displayed           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hms_core::money::Money;
//!
//! let plan = Money::from_cents(49999); // $499.99
//! let down = Money::from_cents(149999); // $1499.99
//!
//! let initial = plan + down;
//! assert_eq!(initial, Money::from_cents(199998));
//! assert_eq!(initial.to_string(), "$1999.98");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::types::DiscountRate;

/// Decimal places shown to people (cents).
pub const DISPLAY_DECIMAL_PLACES: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the marketplace currency (USD).
///
/// ## Design Decisions
/// - **Decimal (signed)**: allows negative values for credits
/// - **Unrounded storage**: `49.999` stays `49.999` so totals re-sum exactly
/// - **String on the wire**: serde writes `"49.999"`, never a float
///
/// ## Where Money is Used
/// ```text
/// Module.price ──┬──► subtotal ──► bundle discount ──► coupon discount ──► total
///                │                                                          │
/// Plan.price ────┘                                 Plan.down_payment ──► initial payment
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a Money value from an exact decimal amount in dollars.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use hms_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, DISPLAY_DECIMAL_PLACES))
    }

    /// Creates a Money value from whole dollars.
    #[inline]
    pub fn from_dollars(dollars: i64) -> Self {
        Money(Decimal::from(dollars))
    }

    /// Adds without panicking on decimal overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Sums amounts, returning `None` on decimal overflow.
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Returns the exact underlying amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative amounts to zero.
    ///
    /// Used for the amount actually captured at checkout; pricing figures
    /// themselves are never clamped.
    #[inline]
    pub fn non_negative(&self) -> Self {
        Money(self.0.max(Decimal::ZERO))
    }

    /// Returns `self × rate` without rounding.
    ///
    /// ## Example
    /// ```rust
    /// use hms_core::money::Money;
    /// use hms_core::types::DiscountRate;
    ///
    /// let plan = Money::from_cents(49999);
    /// let rate = DiscountRate::from_percent(10).unwrap();
    /// assert_eq!(plan.portion(rate).amount().to_string(), "49.9990");
    /// ```
    #[inline]
    pub fn portion(&self, rate: DiscountRate) -> Money {
        Money(self.0 * rate.value())
    }

    /// Rounds to whole cents, half away from zero.
    ///
    /// ## Note
    /// Pricing never calls this. It exists for display and for collaborators
    /// that can only charge whole cents.
    #[inline]
    pub fn round_to_cents(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows money rounded to cents: `$449.99`, `-$5.50`.
///
/// ## Note
/// This rounds for display only. Use `amount()` for the exact figure.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_cents().0;
        let sign = if rounded < Decimal::ZERO { "-" } else { "" };
        write!(f, "{}${:.2}", sign, rounded.abs())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parses `"499.99"` or `"$499.99"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        Decimal::from_str(digits).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by an exact decimal factor.
impl Mul<Decimal> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, factor: Decimal) -> Self {
        Money(self.0 * factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
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

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_from_cents() {
        let price = Money::from_cents(1099);
        assert_eq!(price.amount(), Decimal::new(1099, 2));
        assert_eq!(price, money("10.99"));
    }

    #[test]
    fn test_display_rounds_to_cents() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_dollars(5).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
        assert_eq!(money("449.991").to_string(), "$449.99");
        assert_eq!(money("0.005").to_string(), "$0.01");
        assert_eq!(money("-0.001").to_string(), "$0.00");
    }

    #[test]
    fn test_parse_accepts_dollar_sign() {
        assert_eq!(money("$12.50"), Money::from_cents(1250));
        assert!("twelve".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_dollars(10);
        let b = Money::from_dollars(4);

        assert_eq!(a + b, Money::from_dollars(14));
        assert_eq!(a - b, Money::from_dollars(6));
        assert_eq!(b - a, Money::from_dollars(-6));
        assert_eq!(-a, Money::from_dollars(-10));
        assert_eq!(a * Decimal::new(5, 2), money("0.5"));
    }

    #[test]
    fn test_portion_keeps_sub_cent_precision() {
        let plan = money("499.99");
        let rate = DiscountRate::from_percent(10).unwrap();
        assert_eq!(plan.portion(rate), money("49.999"));
    }

    #[test]
    fn test_decimal_has_no_float_drift() {
        // 0.1 + 0.2 == 0.3 must hold exactly
        let total: Money = [money("0.1"), money("0.2")].iter().sum();
        assert_eq!(total, money("0.3"));
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());

        let credit = Money::from_cents(-100);
        assert!(credit.is_negative());
        assert_eq!(credit.abs(), Money::from_cents(100));
        assert_eq!(credit.non_negative(), Money::ZERO);
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&money("49.999")).unwrap();
        assert_eq!(json, "\"49.999\"");

        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, money("49.999"));
    }

    #[test]
    fn test_checked_sum_reports_overflow() {
        let max = Money::from_decimal(Decimal::MAX);
        assert_eq!(Money::checked_sum([max, max]), None);
        assert_eq!(max.checked_add(max), None);
        assert_eq!(
            Money::checked_sum([money("10"), money("40"), money("50")]),
            Some(money("100"))
        );
        assert_eq!(Money::checked_sum(Vec::new()), Some(Money::ZERO));
    }
}
