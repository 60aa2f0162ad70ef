//! Fixed-point monetary amounts.
//!
//! Amounts are stored as integer minor units (cents). All arithmetic is checked;
//! an overflowing sum is a hard failure, never a silent wrap. Floating point is
//! deliberately absent so `quantity * price` sums carry no rounding drift.

use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// A monetary amount in minor units (cents).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Build an amount from minor units (e.g. `1050` == 10.50).
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// The raw minor-unit value.
    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition; `None` on i64 overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked multiplication by a line quantity; `None` on i64 overflow.
    pub fn checked_mul_quantity(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }
}

impl ValueObject for Money {}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_renders_two_decimal_places() {
        assert_eq!(Money::from_minor(2500).to_string(), "25.00");
        assert_eq!(Money::from_minor(105).to_string(), "1.05");
        assert_eq!(Money::from_minor(-7).to_string(), "-0.07");
    }

    #[test]
    fn overflow_is_detected_not_wrapped() {
        assert_eq!(Money::from_minor(i64::MAX).checked_add(Money::from_minor(1)), None);
        assert_eq!(Money::from_minor(i64::MAX).checked_mul_quantity(2), None);
    }

    proptest! {
        #[test]
        fn add_matches_i64_addition(a in -1_000_000_000i64..1_000_000_000, b in -1_000_000_000i64..1_000_000_000) {
            let sum = Money::from_minor(a).checked_add(Money::from_minor(b)).unwrap();
            prop_assert_eq!(sum.minor(), a + b);
        }

        #[test]
        fn mul_matches_i64_multiplication(price in 0i64..10_000_000, qty in 0i64..100_000) {
            let total = Money::from_minor(price).checked_mul_quantity(qty).unwrap();
            prop_assert_eq!(total.minor(), price * qty);
        }
    }
}
