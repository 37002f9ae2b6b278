use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::checked_sum;
use crate::error::CarKeepError;
use crate::models::vehicle::non_negative;

/// Monthly running costs on top of financing. Not part of the horizon
/// tables; used by the cross-scenario analysis.
///
/// Omitted fields take the defaults of $100 insurance, $50 maintenance and
/// $150 fuel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingCosts {
    #[serde(default = "default_insurance")]
    pub insurance_monthly: Decimal,
    #[serde(default = "default_maintenance")]
    pub maintenance_monthly: Decimal,
    #[serde(default = "default_fuel")]
    pub fuel_monthly: Decimal,
}

fn default_insurance() -> Decimal {
    Decimal::from(100)
}

fn default_maintenance() -> Decimal {
    Decimal::from(50)
}

fn default_fuel() -> Decimal {
    Decimal::from(150)
}

impl Default for OperatingCosts {
    fn default() -> Self {
        Self {
            insurance_monthly: default_insurance(),
            maintenance_monthly: default_maintenance(),
            fuel_monthly: default_fuel(),
        }
    }
}

impl OperatingCosts {
    /// Insurance + maintenance + fuel.
    pub fn monthly_total(&self) -> Result<Decimal, CarKeepError> {
        checked_sum(
            [self.insurance_monthly, self.maintenance_monthly, self.fuel_monthly],
            "monthly operating costs",
        )
    }

    pub fn validate(
        &self,
        prefix: &str,
    ) -> Result<(), CarKeepError> {
        non_negative(&format!("{prefix}.insurance_monthly"), self.insurance_monthly)?;
        non_negative(&format!("{prefix}.maintenance_monthly"), self.maintenance_monthly)?;
        non_negative(&format!("{prefix}.fuel_monthly"), self.fuel_monthly)
    }
}
