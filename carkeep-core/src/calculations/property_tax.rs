//! Annual vehicle property tax with state relief.
//!
//! For each horizon year:
//!
//! | Step | Value |
//! |------|-------|
//! | 1 | taxable = assessed value, less impairment when it affects taxes, floored at 0 |
//! | 2 | gross = taxable × property_tax_rate |
//! | 3 | relief = capped relief credit (see [`ReliefCapBasis`]), never above gross |
//! | 4 | net = max(gross − relief, 0) |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use carkeep_core::calculations::PropertyTaxCalculator;
//! use carkeep_core::{ReliefCapBasis, StateTaxConfig, Vehicle};
//!
//! let config = StateTaxConfig {
//!     state_code: "VA".to_string(),
//!     state_name: "Virginia".to_string(),
//!     property_tax_rate: dec!(0.045),
//!     pptra_relief: dec!(0.50),
//!     relief_cap: dec!(2800),
//!     relief_cap_basis: ReliefCapBasis::ReliefAmount,
//! };
//! let vehicle = Vehicle {
//!     name: "Sedan".to_string(),
//!     msrp: dec!(30000),
//!     current_value: dec!(24000),
//!     values_3yr: vec![dec!(20000), dec!(20000), dec!(20000)],
//!     impairment: dec!(0),
//!     impairment_affects_taxes: false,
//! };
//!
//! let schedule = PropertyTaxCalculator::new(&config).calculate(&vehicle).unwrap();
//!
//! assert_eq!(schedule.years[0].gross_tax, dec!(900.00));
//! assert_eq!(schedule.years[0].relief_credit, dec!(450.00));
//! assert_eq!(schedule.years[0].net_tax, dec!(450.00));
//! assert_eq!(schedule.total_net, dec!(1350.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{checked_mul, checked_sum, max, min, round_half_up};
use crate::error::CarKeepError;
use crate::models::{HORIZON_YEARS, ReliefCapBasis, StateTaxConfig, Vehicle};
use crate::registry::StateTaxRegistry;

/// Tax owed for one horizon year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTaxYear {
    /// 1-based horizon year.
    pub year: u8,
    pub taxable_value: Decimal,
    pub gross_tax: Decimal,
    pub relief_credit: Decimal,
    pub net_tax: Decimal,
}

/// Property tax for every horizon year plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTaxSchedule {
    pub state_code: String,
    pub years: Vec<PropertyTaxYear>,
    pub total_gross: Decimal,
    pub total_relief: Decimal,
    pub total_net: Decimal,
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyTaxCalculator<'a> {
    config: &'a StateTaxConfig,
}

impl<'a> PropertyTaxCalculator<'a> {
    pub fn new(config: &'a StateTaxConfig) -> Self {
        Self { config }
    }

    /// Resolves `state_code` in `registry` and builds a calculator for it.
    ///
    /// # Errors
    ///
    /// [`CarKeepError::NotFound`] when the code is not registered.
    pub fn for_state(
        registry: &'a StateTaxRegistry,
        state_code: &str,
    ) -> Result<Self, CarKeepError> {
        registry.get(state_code).map(Self::new)
    }

    /// Computes the three-year schedule for `vehicle`.
    ///
    /// # Errors
    ///
    /// * [`CarKeepError::Validation`] if the configuration or the vehicle is
    ///   invalid.
    /// * [`CarKeepError::Computation`] on arithmetic overflow.
    pub fn calculate(
        &self,
        vehicle: &Vehicle,
    ) -> Result<PropertyTaxSchedule, CarKeepError> {
        self.config.validate()?;
        vehicle.validate("vehicle")?;

        let years = (1..=HORIZON_YEARS)
            .map(|year| self.year(vehicle, year))
            .collect::<Result<Vec<_>, _>>()?;

        let schedule = PropertyTaxSchedule {
            state_code: self.config.state_code.clone(),
            total_gross: checked_sum(years.iter().map(|y| y.gross_tax), "gross property tax")?,
            total_relief: checked_sum(years.iter().map(|y| y.relief_credit), "property tax relief")?,
            total_net: checked_sum(years.iter().map(|y| y.net_tax), "net property tax")?,
            years,
        };
        debug!(
            state = %schedule.state_code,
            total_net = %schedule.total_net,
            "property tax schedule computed"
        );
        Ok(schedule)
    }

    fn year(
        &self,
        vehicle: &Vehicle,
        year: usize,
    ) -> Result<PropertyTaxYear, CarKeepError> {
        let taxable_value = vehicle.taxable_value(year).ok_or_else(|| {
            CarKeepError::Computation(format!("no assessed value for year {year}"))
        })?;
        let gross_tax = self.gross_tax(taxable_value)?;
        let relief_credit = self.relief_credit(taxable_value, gross_tax)?;
        let net_tax = self.net_tax(gross_tax, relief_credit);

        Ok(PropertyTaxYear {
            // HORIZON_YEARS is far below u8::MAX.
            year: year as u8,
            taxable_value,
            gross_tax,
            relief_credit,
            net_tax,
        })
    }

    /// Step 2: taxable value × rate.
    fn gross_tax(
        &self,
        taxable_value: Decimal,
    ) -> Result<Decimal, CarKeepError> {
        checked_mul(taxable_value, self.config.property_tax_rate, "gross property tax")
            .map(round_half_up)
    }

    /// Step 3: the relief credit, bounded by the cap and by the gross tax.
    fn relief_credit(
        &self,
        taxable_value: Decimal,
        gross_tax: Decimal,
    ) -> Result<Decimal, CarKeepError> {
        let config = self.config;
        let uncapped = match config.relief_cap_basis {
            ReliefCapBasis::ReliefAmount => {
                let credit = checked_mul(gross_tax, config.pptra_relief, "property tax relief")?;
                min(credit, config.relief_cap)
            }
            ReliefCapBasis::TaxableValue => {
                let relieved_value = min(taxable_value, config.relief_cap);
                let relieved_tax =
                    checked_mul(relieved_value, config.property_tax_rate, "property tax relief")?;
                checked_mul(relieved_tax, config.pptra_relief, "property tax relief")?
            }
        };
        Ok(min(round_half_up(uncapped), gross_tax))
    }

    /// Step 4: gross less relief, floored at zero.
    fn net_tax(
        &self,
        gross_tax: Decimal,
        relief_credit: Decimal,
    ) -> Decimal {
        let net = gross_tax.saturating_sub(relief_credit);
        if net < Decimal::ZERO {
            warn!(
                gross = %gross_tax,
                relief = %relief_credit,
                "relief exceeds gross tax, flooring net tax at zero"
            );
        }
        max(net, Decimal::ZERO)
    }
}
