use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CarKeepError;

/// What the state's relief cap bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliefCapBasis {
    /// The cap bounds the relief credit in dollars:
    /// `relief = min(gross × pptra_relief, relief_cap)`.
    #[default]
    ReliefAmount,
    /// Relief applies only to the first `relief_cap` dollars of taxable value:
    /// `relief = min(taxable, relief_cap) × rate × pptra_relief`.
    TaxableValue,
}

impl ReliefCapBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReliefAmount => "relief_amount",
            Self::TaxableValue => "taxable_value",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "" | "relief_amount" => Some(Self::ReliefAmount),
            "taxable_value" => Some(Self::TaxableValue),
            _ => None,
        }
    }
}

/// Per-state vehicle property tax parameters. Rates are fractions
/// (`0.045` is 4.5%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxConfig {
    pub state_code: String,
    pub state_name: String,
    pub property_tax_rate: Decimal,
    pub pptra_relief: Decimal,
    pub relief_cap: Decimal,
    #[serde(default)]
    pub relief_cap_basis: ReliefCapBasis,
}

impl StateTaxConfig {
    /// Checks the code, name, rates and cap.
    ///
    /// # Errors
    ///
    /// Returns [`CarKeepError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CarKeepError> {
        validate_state_code("state_code", &self.state_code)?;
        if self.state_name.trim().is_empty() {
            return Err(CarKeepError::validation("state_name", "must not be empty"));
        }
        check_fraction("property_tax_rate", self.property_tax_rate)?;
        check_fraction("pptra_relief", self.pptra_relief)?;
        if self.relief_cap < Decimal::ZERO {
            return Err(CarKeepError::validation(
                "relief_cap",
                format!("must be non-negative, got {}", self.relief_cap),
            ));
        }
        Ok(())
    }

    /// Returns a copy with the state code upper-cased and the name trimmed.
    pub fn normalized(mut self) -> Self {
        self.state_code = normalize_state_code(&self.state_code);
        self.state_name = self.state_name.trim().to_string();
        self
    }
}

/// Upper-cases and trims a state code.
pub fn normalize_state_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A state code is exactly two ASCII letters, in either case.
pub fn validate_state_code(
    field: &str,
    code: &str,
) -> Result<(), CarKeepError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CarKeepError::validation(field, "state code is required"));
    }
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CarKeepError::validation(
            field,
            format!("'{code}' is not a two-letter state code"),
        ));
    }
    Ok(())
}

fn check_fraction(
    field: &str,
    value: Decimal,
) -> Result<(), CarKeepError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CarKeepError::validation(
            field,
            format!("must be between 0 and 1, got {value}"),
        ));
    }
    Ok(())
}
