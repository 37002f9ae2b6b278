//! Financing cost over the 36-month comparison horizon.
//!
//! Scenario loans and leases are paid for `min(term, 36)` months. The
//! baseline loan is paid for the full horizon at its scheduled payment plus
//! any extra principal. Lease residuals and early-termination costs are not
//! modelled.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{checked_add, checked_mul, round_half_up};
use crate::error::CarKeepError;
use crate::models::{CurrentLoan, Financing, HORIZON_YEARS};

/// Length of the comparison horizon in months.
pub const HORIZON_MONTHS: u32 = 36;

const MONTHS_PER_YEAR: u32 = 12;

/// Payments made over the horizon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingCost {
    /// Cash leaving the owner's account each month while payments run.
    pub monthly_cash_outflow: Decimal,
    /// Number of monthly payments that fall inside the horizon.
    pub months_paid: u32,
    pub total_over_horizon: Decimal,
    /// Payments made in each horizon year.
    pub yearly_totals: Vec<Decimal>,
}

impl FinancingCost {
    /// Average monthly payment within horizon year `year` (1-based).
    pub fn average_monthly(
        &self,
        year: usize,
    ) -> Option<Decimal> {
        let total = *self.yearly_totals.get(year.checked_sub(1)?)?;
        Some(round_half_up(total / Decimal::from(MONTHS_PER_YEAR)))
    }
}

/// Total cost of a scenario's loan or lease over the horizon.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::financing_cost;
/// use carkeep_core::{Financing, LoanTerms};
///
/// let loan = Financing::Loan(LoanTerms {
///     monthly_payment: dec!(500),
///     loan_term: 60,
///     principal_balance: dec!(25000),
/// });
///
/// let cost = financing_cost(&loan).unwrap();
///
/// assert_eq!(cost.months_paid, 36);
/// assert_eq!(cost.total_over_horizon, dec!(18000));
/// ```
///
/// # Errors
///
/// * [`CarKeepError::Validation`] for a negative payment or a zero term.
/// * [`CarKeepError::Computation`] on overflow.
pub fn financing_cost(financing: &Financing) -> Result<FinancingCost, CarKeepError> {
    financing.validate("financing")?;

    let term = financing.term_months();
    if term < HORIZON_MONTHS {
        if let Financing::Lease(_) = financing {
            warn!(
                lease_terms = term,
                horizon = HORIZON_MONTHS,
                "lease ends before the horizon, remaining months carry no cost"
            );
        }
    } else if term > HORIZON_MONTHS {
        debug!(term, horizon = HORIZON_MONTHS, "term extends past the horizon, truncating");
    }

    schedule(financing.monthly_payment(), term.min(HORIZON_MONTHS))
}

/// Cost of keeping the current loan: `(monthly_payment + extra_payment)` for
/// every month of the horizon.
pub fn baseline_financing_cost(loan: &CurrentLoan) -> Result<FinancingCost, CarKeepError> {
    loan.validate("current_loan")?;
    schedule(loan.monthly_outflow()?, HORIZON_MONTHS)
}

fn schedule(
    monthly: Decimal,
    months_paid: u32,
) -> Result<FinancingCost, CarKeepError> {
    let mut yearly_totals = Vec::with_capacity(HORIZON_YEARS);
    let mut total_over_horizon = Decimal::ZERO;
    for year in 0..HORIZON_YEARS as u32 {
        let months_in_year = months_paid
            .saturating_sub(year * MONTHS_PER_YEAR)
            .min(MONTHS_PER_YEAR);
        let total = round_half_up(checked_mul(
            monthly,
            Decimal::from(months_in_year),
            "yearly financing total",
        )?);
        total_over_horizon = checked_add(total_over_horizon, total, "financing total")?;
        yearly_totals.push(total);
    }

    Ok(FinancingCost {
        monthly_cash_outflow: monthly,
        months_paid,
        total_over_horizon,
        yearly_totals,
    })
}
