//! # Money
//!
//! Integer cents for every stored amount, exact decimals for split math.
//!
//! ## Cents at Rest, Decimals in Flight
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHERE PRECISION MATTERS                                                │
//! │                                                                         │
//! │  Entered prices, taxes, tip      ──► Money (integer cents)              │
//! │  Persisted splits, balances      ──► Money (integer cents)              │
//! │                                                                         │
//! │  Shared item share  30.00 / 7    ──► Decimal (exact, not rounded)       │
//! │  Tax rate           8.00 / 100 + 1                                      │
//! │  Tip share          10.00 / 3                                           │
//! │                                                                         │
//! │  Decimal ──► Money happens exactly once: Money::ceil_from_decimal       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use splitstack_core::money::Money;
//!
//! let price = Money::from_cents(1099); // $10.99
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.cents(), 1599);
//!
//! let parsed: Money = "12.5".parse().unwrap();
//! assert_eq!(parsed.cents(), 1250);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Decimal places kept before the final ceiling.
///
/// Repeating divisions such as `20 / 3` are stored with 28 significant
/// digits; multiplying them back can land a hair above a whole cent
/// (`6.666…67 × 1.5 = 10.000…05`). Normalizing to this many places first
/// means only real sub-cent remainders are rounded up.
const CEILING_NOISE_DP: u32 = 9;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in cents.
///
/// - **i64 (signed)**: net balances are negative for debtors
/// - **Single field tuple struct**: serializes as a plain integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// `Money::from_cents(1099)` is $10.99.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Debtor side of a net balance.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Magnitude, used when comparing balances against the settlement threshold.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts read from documents, `None` if the total does not fit.
    ///
    /// ```rust
    /// use splitstack_core::money::Money;
    ///
    /// let parts = [Money::from_cents(250), Money::from_cents(750)];
    /// assert_eq!(Money::checked_sum(parts), Some(Money::from_cents(1000)));
    /// assert_eq!(Money::checked_sum([Money::from_cents(i64::MAX), Money::from_cents(1)]), None);
    /// ```
    pub fn checked_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }

    /// Returns the exact decimal value in dollars (`1099` cents → `10.99`).
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Converts a decimal dollar amount to Money, rounding **up** to the
    /// next whole cent.
    ///
    /// Returns `None` when the amount does not fit in i64 cents.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use splitstack_core::money::Money;
    ///
    /// let third = Decimal::from(10) / Decimal::from(3); // 3.333…
    /// assert_eq!(Money::ceil_from_decimal(third).unwrap().cents(), 334);
    ///
    /// let exact = Decimal::new(5400, 2); // 54.00
    /// assert_eq!(Money::ceil_from_decimal(exact).unwrap().cents(), 5400);
    /// ```
    pub fn ceil_from_decimal(amount: Decimal) -> Option<Money> {
        amount
            .round_dp(CEILING_NOISE_DP)
            .round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a user-entered dollar amount (`"12"`, `"12.5"`, `"12.50"`).
///
/// More than two decimal places is rejected rather than silently rounded.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let value = Decimal::from_str(trimmed).map_err(|_| invalid("must be a number"))?;
        if value.normalize().scale() > 2 {
            return Err(invalid("must have at most two decimal places"));
        }

        value
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .map(Money)
            .ok_or_else(|| invalid("is too large"))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$10.99`, `-$5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "${}.{:02}", magnitude / 100, magnitude % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

// The operators follow i64 overflow rules. Totals over stored documents go
// through `checked_add` / `checked_sum` instead.

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
        Money(self.0.saturating_neg())
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
