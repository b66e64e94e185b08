//! # Money Module
//!
//! Provides the `Money` type for prices, balances and order totals.
//!
//! ## Minor Units Only
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount in the engine is an integer count of minor units          │
//! │                                                                         │
//! │  BookListing.price ──► LineItem.price (frozen) ──► Order total          │
//! │                                                         │               │
//! │  User.balance ◄──────── guarded debit ──────────────────┘               │
//! │                                                                         │
//! │  Totals use checked arithmetic: an overflowing order is rejected,       │
//! │  never wrapped into a small (or negative) charge.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bookstore_core::money::Money;
//!
//! let price = Money::from_cents(100);
//! let line = price.checked_mul_count(3).unwrap();
//! assert_eq!(line.cents(), 300);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: matches SQLite INTEGER, so no conversions at the storage edge
/// - **Transparent serde**: serialized as a bare integer in history snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a count, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use bookstore_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_mul_count(3).unwrap().cents(), 897);
    /// assert!(Money::from_cents(i64::MAX).checked_mul_count(2).is_none());
    /// ```
    #[inline]
    pub fn checked_mul_count(&self, count: i64) -> Option<Self> {
        self.0.checked_mul(count).map(Money)
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the raw minor-unit amount; presentation belongs to the caller.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_mul_count() {
        let unit_price = Money::from_cents(100);
        assert_eq!(unit_price.checked_mul_count(3), Some(Money::from_cents(300)));
        assert_eq!(unit_price.checked_mul_count(0), Some(Money::zero()));
        assert_eq!(Money::from_cents(i64::MAX / 2 + 1).checked_mul_count(2), None);
    }

    #[test]
    fn test_checked_add() {
        let a = Money::from_cents(1000);
        assert_eq!(a.checked_add(Money::from_cents(500)).unwrap().cents(), 1500);
        assert!(Money::from_cents(i64::MAX).checked_add(a).is_none());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_cents(300)).unwrap();
        assert_eq!(json, "300");
    }

    #[test]
    fn test_arithmetic_and_display() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(300);
        assert_eq!((a - b).cents(), 700);
        assert_eq!((a + b).to_string(), "1300");
        assert!((b - a).is_negative());
    }
}
