//! Decimal arithmetic utilities for fixed-point price handling.
//!
//! Venue prices travel through the engine as integer cents. Conversions in and
//! out of cents always round half up (midpoint away from zero) so that a
//! display value reconstructed as `cents / 100` is deterministic.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Scale of the oracle's raw `*_x18` price fields.
pub const X18_SCALE: u32 = 18;

/// Round half up (midpoint away from zero) to `decimals` places.
pub fn round_half_up(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert a currency amount to integer cents.
///
/// Returns `None` if the rounded value does not fit in an `i64`.
pub fn to_cents(value: Decimal) -> Option<i64> {
    value
        .checked_mul(dec!(100))
        .and_then(|scaled| round_half_up(scaled, 0).to_i64())
}

/// Convert integer cents back to a currency amount with scale 2.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Parse an 18-decimal fixed-point integer string exactly.
///
/// `"90602000000000000000000"` becomes `90602`. Values outside the range a
/// `Decimal` can carry at that scale yield `None`.
pub fn from_x18(raw: &str) -> Option<Decimal> {
    let mantissa: i128 = raw.trim().parse().ok()?;
    Decimal::try_from_i128_with_scale(mantissa, X18_SCALE)
        .ok()
        .map(|d| d.normalize())
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_cents_rounds_half_up() {
        assert_eq!(to_cents(dec!(5.00)), Some(500));
        assert_eq!(to_cents(dec!(-5)), Some(-500));
        assert_eq!(to_cents(dec!(0.005)), Some(1));
        assert_eq!(to_cents(dec!(-0.005)), Some(-1));
        assert_eq!(to_cents(dec!(0.0049)), Some(0));
        assert_eq!(to_cents(dec!(90602.00)), Some(9_060_200));
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(from_cents(9_059_700), dec!(90597.00));
        assert_eq!(from_cents(9_059_700).to_string(), "90597.00");
        assert_eq!(from_cents(-1).to_string(), "-0.01");
    }

    #[test]
    fn test_from_x18() {
        assert_eq!(from_x18("90602000000000000000000"), Some(dec!(90602)));
        assert_eq!(from_x18("90602125000000000000000"), Some(dec!(90602.125)));
        assert_eq!(from_x18("-1500000000000000000"), Some(dec!(-1.5)));
        assert_eq!(from_x18("not a number"), None);
        assert_eq!(from_x18(""), None);
    }

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(dec!(1), dec!(0)), Decimal::ZERO);
        assert_eq!(safe_div(dec!(1), dec!(4)), dec!(0.25));
    }
}
