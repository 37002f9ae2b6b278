use serde::{Deserialize, Serialize};

use crate::error::CarKeepError;
use crate::models::financing::{CurrentLoan, Financing};
use crate::models::operating_costs::OperatingCosts;
use crate::models::state_tax::validate_state_code;
use crate::models::trade_in::TradeIn;
use crate::models::vehicle::Vehicle;

/// An alternative to keeping the current vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub key: String,
    pub description: String,
    pub state_code: String,
    pub vehicle: Vehicle,
    pub financing: Financing,
    #[serde(default)]
    pub trade_in: Option<TradeIn>,
    /// Running costs; the defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_costs: Option<OperatingCosts>,
}

impl Scenario {
    pub fn validate(&self) -> Result<(), CarKeepError> {
        if self.key.trim().is_empty() {
            return Err(CarKeepError::validation("scenario.key", "must not be empty"));
        }
        validate_state_code("scenario.state_code", &self.state_code)?;
        self.vehicle.validate("scenario.vehicle")?;
        self.financing.validate("scenario.financing")?;
        if let Some(trade_in) = &self.trade_in {
            trade_in.validate("scenario.trade_in")?;
        }
        if let Some(costs) = &self.operating_costs {
            costs.validate("scenario.operating_costs")?;
        }
        Ok(())
    }

    /// Header for this scenario's column in comparison tables.
    pub fn column_label(&self) -> String {
        format!("{} ({})", self.vehicle.name, self.financing.label())
    }

    pub fn operating_costs(&self) -> OperatingCosts {
        self.operating_costs.clone().unwrap_or_default()
    }
}

/// The vehicle and loan the owner already has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub description: String,
    pub state_code: String,
    pub vehicle: Vehicle,
    pub current_loan: CurrentLoan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_costs: Option<OperatingCosts>,
}

impl Baseline {
    pub fn validate(&self) -> Result<(), CarKeepError> {
        validate_state_code("baseline.state_code", &self.state_code)?;
        self.vehicle.validate("baseline.vehicle")?;
        self.current_loan.validate("baseline.current_loan")?;
        if let Some(costs) = &self.operating_costs {
            costs.validate("baseline.operating_costs")?;
        }
        Ok(())
    }

    pub fn column_label(&self) -> String {
        format!("{} (Keep Current Car)", self.vehicle.name)
    }

    pub fn operating_costs(&self) -> OperatingCosts {
        self.operating_costs.clone().unwrap_or_default()
    }
}
