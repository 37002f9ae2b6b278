use rust_decimal::Decimal;

use crate::calculations::common::{checked_mul, round_dollars};
use crate::error::CarKeepError;
use crate::models::HORIZON_YEARS;

/// Projects a three-year value trajectory from `start_value` by compounding
/// one depreciation fraction per year. Each year's value is rounded to whole
/// dollars before the next year's depreciation is applied.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::depreciation_schedule;
///
/// let values = depreciation_schedule(dec!(21000), &[dec!(0.10), dec!(0.10), dec!(0.10)]).unwrap();
///
/// assert_eq!(values, vec![dec!(18900), dec!(17010), dec!(15309)]);
/// ```
///
/// # Errors
///
/// [`CarKeepError::Validation`] unless exactly three fractions in `[0, 1]`
/// are given and the start value is non-negative.
pub fn depreciation_schedule(
    start_value: Decimal,
    rates: &[Decimal],
) -> Result<Vec<Decimal>, CarKeepError> {
    if start_value < Decimal::ZERO {
        return Err(CarKeepError::validation(
            "start_value",
            format!("must be non-negative, got {start_value}"),
        ));
    }
    if rates.len() != HORIZON_YEARS {
        return Err(CarKeepError::validation(
            "rates",
            format!("expected {HORIZON_YEARS} rates, got {}", rates.len()),
        ));
    }

    let mut value = start_value;
    let mut values = Vec::with_capacity(HORIZON_YEARS);
    for (index, rate) in rates.iter().enumerate() {
        if *rate < Decimal::ZERO || *rate > Decimal::ONE {
            return Err(CarKeepError::validation(
                format!("rates[{index}]"),
                format!("must be between 0 and 1, got {rate}"),
            ));
        }
        value = round_dollars(checked_mul(value, Decimal::ONE - rate, "depreciated value")?);
        values.push(value);
    }
    Ok(values)
}
