//! Rounding and overflow-checked arithmetic shared by the calculators.
//!
//! Amounts are carried at cent precision through every calculation and only
//! reduced to whole dollars when building display tables.

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::error;

use crate::error::CarKeepError;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds to whole dollars, half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::common::round_dollars;
///
/// assert_eq!(round_dollars(dec!(449.50)), dec!(450));
/// assert_eq!(round_dollars(dec!(-2499.50)), dec!(-2500));
/// ```
pub fn round_dollars(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the smaller of two decimal values.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}

/// `a × b`, or [`CarKeepError::Computation`] naming `what` on overflow.
pub fn checked_mul(
    a: Decimal,
    b: Decimal,
    what: &str,
) -> Result<Decimal, CarKeepError> {
    a.checked_mul(b).ok_or_else(|| overflow(what, a, b))
}

/// `a + b`, or [`CarKeepError::Computation`] naming `what` on overflow.
pub fn checked_add(
    a: Decimal,
    b: Decimal,
    what: &str,
) -> Result<Decimal, CarKeepError> {
    a.checked_add(b).ok_or_else(|| overflow(what, a, b))
}

/// `a − b`, or [`CarKeepError::Computation`] naming `what` on overflow.
pub fn checked_sub(
    a: Decimal,
    b: Decimal,
    what: &str,
) -> Result<Decimal, CarKeepError> {
    a.checked_sub(b).ok_or_else(|| overflow(what, a, b))
}

/// Sums `values`, failing on overflow.
pub fn checked_sum<I>(
    values: I,
    what: &str,
) -> Result<Decimal, CarKeepError>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| checked_add(acc, value, what))
}

fn overflow(
    what: &str,
    a: Decimal,
    b: Decimal,
) -> CarKeepError {
    error!(operation = what, lhs = %a, rhs = %b, "decimal overflow");
    CarKeepError::Computation(format!("{what} overflowed"))
}
