//! Shared decimal helpers for the commission calculations.
//!
//! Every helper here is total: arithmetic overflow or a zero divisor
//! produces `None` rather than panicking, which callers surface as an
//! unset field.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero. Only presentation
/// values are rounded; calculations keep full precision.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use commission_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Divides `value` by `divisor`, returning `None` for a zero divisor or overflow.
pub fn checked_ratio(
    value: Decimal,
    divisor: Decimal,
) -> Option<Decimal> {
    value.checked_div(divisor)
}

/// Scales `value` by `rate / developers_rate`.
///
/// Multiplication happens first so that exact inputs such as
/// `10000 × 4 / 5` stay exact.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use commission_core::calculations::common::share;
///
/// assert_eq!(share(dec!(10000), dec!(4.0), dec!(5.0)), Some(dec!(8000)));
/// assert_eq!(share(dec!(10000), dec!(4.0), dec!(0)), None);
/// ```
pub fn share(
    value: Decimal,
    rate: Decimal,
    developers_rate: Decimal,
) -> Option<Decimal> {
    value.checked_mul(rate)?.checked_div(developers_rate)
}

/// Multiplies `value` by a fractional rate, returning `None` on overflow.
pub fn portion(
    value: Decimal,
    rate: Decimal,
) -> Option<Decimal> {
    value.checked_mul(rate)
}
