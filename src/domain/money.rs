//! Integer money type for whole-currency-unit amounts.
//!
//! All settlement arithmetic works in integer currency units: divisions floor
//! and the remainder is assigned to the platform side, never to a payee.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

/// Monetary amount in whole currency units.
///
/// Backed by `i64`; serializes as a plain JSON number.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(pub i64);

impl Money {
    /// Create a Money value from whole currency units.
    pub fn new(units: i64) -> Self {
        Money(units)
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Money(0)
    }

    /// Get the underlying integer value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the value is < 0.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiply by an integer count (e.g. a per-merchant surcharge).
    pub fn times(&self, count: i64) -> Money {
        Money(self.0 * count)
    }

    /// Floor `percent`% of this amount.
    ///
    /// The dropped remainder stays with whoever computes the residual share.
    pub fn percent(&self, percent: i64) -> Money {
        Money(self.0 * percent / 100)
    }

    /// Floor `numerator/denominator` of this amount.
    pub fn ratio(&self, numerator: i64, denominator: i64) -> Money {
        Money(self.0 * numerator / denominator)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl std::ops::Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}
