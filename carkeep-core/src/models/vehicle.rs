use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CarKeepError;

/// Number of years in the comparison horizon.
pub const HORIZON_YEARS: usize = 3;

/// A vehicle and its projected value over the comparison horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub name: String,
    pub msrp: Decimal,
    pub current_value: Decimal,
    /// Assessed value at the start of each horizon year.
    pub values_3yr: Vec<Decimal>,
    #[serde(default)]
    pub impairment: Decimal,
    #[serde(default)]
    pub impairment_affects_taxes: bool,
}

impl Vehicle {
    /// Validates amounts and the length of the value trajectory. `prefix`
    /// is prepended to field names in errors (e.g. `scenario.vehicle`).
    pub fn validate(
        &self,
        prefix: &str,
    ) -> Result<(), CarKeepError> {
        if self.name.trim().is_empty() {
            return Err(CarKeepError::validation(
                format!("{prefix}.name"),
                "must not be empty",
            ));
        }
        non_negative(&format!("{prefix}.msrp"), self.msrp)?;
        non_negative(&format!("{prefix}.current_value"), self.current_value)?;
        non_negative(&format!("{prefix}.impairment"), self.impairment)?;

        if self.values_3yr.len() != HORIZON_YEARS {
            return Err(CarKeepError::validation(
                format!("{prefix}.values_3yr"),
                format!(
                    "expected {HORIZON_YEARS} values, got {}",
                    self.values_3yr.len()
                ),
            ));
        }
        for (index, value) in self.values_3yr.iter().enumerate() {
            non_negative(&format!("{prefix}.values_3yr[{index}]"), *value)?;
        }
        Ok(())
    }

    /// Value subject to property tax in horizon year `year` (1-based).
    ///
    /// Impairment is subtracted only when it affects taxes; the result is
    /// floored at zero. Returns `None` when `year` is outside the trajectory.
    pub fn taxable_value(
        &self,
        year: usize,
    ) -> Option<Decimal> {
        let assessed = *self.values_3yr.get(year.checked_sub(1)?)?;
        let adjusted = if self.impairment_affects_taxes {
            assessed.saturating_sub(self.impairment)
        } else {
            assessed
        };
        Some(adjusted.max(Decimal::ZERO))
    }
}

pub(crate) fn non_negative(
    field: &str,
    value: Decimal,
) -> Result<(), CarKeepError> {
    if value < Decimal::ZERO {
        return Err(CarKeepError::validation(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}
