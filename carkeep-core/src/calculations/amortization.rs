//! Loan payoff and payment helpers.
//!
//! [`amortize`] walks a balance month by month: each month accrues
//! `balance × rate / 12` of interest and the payment covers that interest
//! first. When the principal portion of a payment would exceed the balance,
//! that payment clears it and no interest is charged for that month.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calculations::common::{checked_add, checked_mul, checked_sub, round_half_up};
use crate::calculations::currency::{format_currency, format_percentage};
use crate::calculations::financing::HORIZON_MONTHS;
use crate::error::CarKeepError;
use crate::models::{CurrentLoan, Table};

/// Outcome of paying down a loan over a bounded number of months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanPayoff {
    pub starting_balance: Decimal,
    pub monthly_payment: Decimal,
    pub annual_rate: Decimal,
    /// Month in which the balance reached zero, if it did.
    pub months_to_payoff: Option<u32>,
    pub total_interest: Decimal,
    pub principal_paid: Decimal,
    pub remaining_balance: Decimal,
}

impl LoanPayoff {
    /// Pays down the baseline loan over the comparison horizon.
    pub fn for_current_loan(loan: &CurrentLoan) -> Result<Self, CarKeepError> {
        loan.validate("current_loan")?;
        amortize(
            loan.principal_balance,
            loan.monthly_outflow()?,
            loan.interest_rate,
            HORIZON_MONTHS,
        )
    }

    pub fn paid_off(&self) -> bool {
        self.months_to_payoff.is_some()
    }

    /// Two-column `Component / Value` display table.
    pub fn to_table(&self) -> Table {
        let payoff = match self.months_to_payoff {
            Some(months) => months.to_string(),
            None => "Not paid off".to_string(),
        };
        let mut table = Table::new(["Component", "Value"]);
        table.push_row(["Starting Balance".to_string(), format_currency(self.starting_balance)]);
        table.push_row(["Monthly Payment".to_string(), format_currency(self.monthly_payment)]);
        table.push_row(["Interest Rate".to_string(), format_percentage(self.annual_rate)]);
        table.push_row(["Months to Payoff".to_string(), payoff]);
        table.push_row(["Total Interest".to_string(), format_currency(self.total_interest)]);
        table.push_row(["Remaining Balance".to_string(), format_currency(self.remaining_balance)]);
        table
    }
}

/// Amortizes `principal` at `monthly_payment` for at most `max_months`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::amortize;
///
/// let payoff = amortize(dec!(1000), dec!(400), dec!(0.12), 36).unwrap();
///
/// assert_eq!(payoff.months_to_payoff, Some(3));
/// assert_eq!(payoff.total_interest, dec!(16.10));
/// assert_eq!(payoff.remaining_balance, dec!(0));
/// ```
///
/// # Errors
///
/// [`CarKeepError::Validation`] for negative amounts, a rate outside
/// `[0, 1]` or a zero month limit.
pub fn amortize(
    principal: Decimal,
    monthly_payment: Decimal,
    annual_rate: Decimal,
    max_months: u32,
) -> Result<LoanPayoff, CarKeepError> {
    validate_loan_inputs(principal, annual_rate, max_months)?;
    if monthly_payment < Decimal::ZERO {
        return Err(CarKeepError::validation(
            "monthly_payment",
            format!("must be non-negative, got {monthly_payment}"),
        ));
    }

    let monthly_rate = annual_rate / Decimal::from(12);
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;
    let mut months_to_payoff = balance.is_zero().then_some(0);

    for month in 1..=max_months {
        if balance.is_zero() {
            break;
        }
        let interest = round_half_up(checked_mul(balance, monthly_rate, "monthly interest")?);
        let principal_portion = checked_sub(monthly_payment, interest, "principal portion")?;
        if principal_portion > balance {
            balance = Decimal::ZERO;
            months_to_payoff = Some(month);
            break;
        }
        if principal_portion <= Decimal::ZERO {
            warn!(
                month,
                interest = %interest,
                payment = %monthly_payment,
                "payment does not cover interest"
            );
        }
        total_interest = checked_add(total_interest, interest, "total interest")?;
        balance = checked_sub(balance, principal_portion, "loan balance")?;
        if balance.is_zero() {
            months_to_payoff = Some(month);
        }
    }

    debug!(
        months_to_payoff = ?months_to_payoff,
        remaining = %balance,
        "amortized loan"
    );
    Ok(LoanPayoff {
        starting_balance: principal,
        monthly_payment,
        annual_rate,
        months_to_payoff,
        total_interest,
        principal_paid: checked_sub(principal, balance, "principal paid")?,
        remaining_balance: balance,
    })
}

/// Level monthly payment that retires `principal` over `months` at
/// `annual_rate`. A zero rate divides the principal evenly.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::amortized_monthly_payment;
///
/// assert_eq!(amortized_monthly_payment(dec!(25000), dec!(0.06), 60).unwrap(), dec!(483.32));
/// assert_eq!(amortized_monthly_payment(dec!(12000), dec!(0), 48).unwrap(), dec!(250.00));
/// ```
pub fn amortized_monthly_payment(
    principal: Decimal,
    annual_rate: Decimal,
    months: u32,
) -> Result<Decimal, CarKeepError> {
    validate_loan_inputs(principal, annual_rate, months)?;
    let periods = Decimal::from(months);
    if annual_rate.is_zero() {
        return Ok(round_half_up(principal / periods));
    }

    let monthly_rate = annual_rate / Decimal::from(12);
    let growth = Decimal::ONE + monthly_rate;
    let mut factor = Decimal::ONE;
    for _ in 0..months {
        factor = checked_mul(factor, growth, "compound factor")?;
    }
    let numerator = checked_mul(checked_mul(principal, monthly_rate, "payment")?, factor, "payment")?;
    let growth_over_term = checked_sub(factor, Decimal::ONE, "compound factor")?;
    if growth_over_term.is_zero() {
        return Ok(round_half_up(principal / periods));
    }
    Ok(round_half_up(numerator / growth_over_term))
}

fn validate_loan_inputs(
    principal: Decimal,
    annual_rate: Decimal,
    months: u32,
) -> Result<(), CarKeepError> {
    if principal < Decimal::ZERO {
        return Err(CarKeepError::validation(
            "principal",
            format!("must be non-negative, got {principal}"),
        ));
    }
    if annual_rate < Decimal::ZERO || annual_rate > Decimal::ONE {
        return Err(CarKeepError::validation(
            "annual_rate",
            format!("must be between 0 and 1, got {annual_rate}"),
        ));
    }
    if months == 0 {
        return Err(CarKeepError::validation("months", "must be at least one month"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // amortize tests
    // =========================================================================

    #[test]
    fn pays_off_within_horizon() {
        let payoff = amortize(dec!(1000), dec!(400), dec!(0.12), 36).unwrap();

        assert_eq!(
            payoff,
            LoanPayoff {
                starting_balance: dec!(1000),
                monthly_payment: dec!(400),
                annual_rate: dec!(0.12),
                months_to_payoff: Some(3),
                total_interest: dec!(16.10),
                principal_paid: dec!(1000),
                remaining_balance: dec!(0),
            }
        );
        assert!(payoff.paid_off());
    }

    #[test]
    fn payment_just_above_balance_still_accrues_interest() {
        // 399 × 1% = 3.99 interest leaves 396.01 of principal, short of
        // the balance, so a second month is needed.
        let payoff = amortize(dec!(399), dec!(400), dec!(0.12), 36).unwrap();

        assert_eq!(payoff.months_to_payoff, Some(2));
        assert_eq!(payoff.total_interest, dec!(3.99));
        assert_eq!(payoff.principal_paid, dec!(399));
    }

    #[test]
    fn principal_portion_exceeding_balance_clears_it_interest_free() {
        let payoff = amortize(dec!(395), dec!(400), dec!(0.12), 36).unwrap();

        assert_eq!(payoff.months_to_payoff, Some(1));
        assert_eq!(payoff.total_interest, dec!(0));
    }

    #[test]
    fn overflowing_outflow_is_a_computation_error() {
        let loan = CurrentLoan {
            monthly_payment: Decimal::MAX,
            principal_balance: dec!(1000),
            interest_rate: dec!(0.05),
            extra_payment: dec!(1),
        };

        assert!(matches!(
            LoanPayoff::for_current_loan(&loan),
            Err(CarKeepError::Computation(msg)) if msg.contains("baseline monthly outflow")
        ));
    }

    #[test]
    fn interest_only_payment_never_pays_off() {
        let payoff = amortize(dec!(10000), dec!(100), dec!(0.12), 36).unwrap();

        assert_eq!(payoff.months_to_payoff, None);
        assert_eq!(payoff.total_interest, dec!(3600.00));
        assert_eq!(payoff.remaining_balance, dec!(10000));
        assert_eq!(payoff.principal_paid, dec!(0));
    }

    #[test]
    fn zero_rate_pays_principal_only() {
        let payoff = amortize(dec!(1200), dec!(100), dec!(0), 36).unwrap();

        assert_eq!(payoff.months_to_payoff, Some(12));
        assert_eq!(payoff.total_interest, dec!(0));
    }

    #[test]
    fn zero_balance_is_already_paid_off() {
        let payoff = amortize(dec!(0), dec!(100), dec!(0.05), 36).unwrap();

        assert_eq!(payoff.months_to_payoff, Some(0));
    }

    #[test]
    fn stops_at_month_limit() {
        let payoff = amortize(dec!(10000), dec!(500), dec!(0), 6).unwrap();

        assert_eq!(payoff.months_to_payoff, None);
        assert_eq!(payoff.remaining_balance, dec!(7000));
    }

    #[test]
    fn rejects_rate_above_one() {
        assert!(matches!(
            amortize(dec!(1000), dec!(100), dec!(4.39), 36),
            Err(CarKeepError::Validation { field, .. }) if field == "annual_rate"
        ));
    }

    #[test]
    fn current_loan_uses_outflow_and_horizon() {
        let loan = CurrentLoan {
            monthly_payment: dec!(300),
            principal_balance: dec!(1000),
            interest_rate: dec!(0.12),
            extra_payment: dec!(100),
        };

        let payoff = LoanPayoff::for_current_loan(&loan).unwrap();

        assert_eq!(payoff.monthly_payment, dec!(400));
        assert_eq!(payoff.months_to_payoff, Some(3));
    }

    #[test]
    fn payoff_table_rows() {
        let payoff = amortize(dec!(1000), dec!(400), dec!(0.12), 36).unwrap();

        let table = payoff.to_table();

        assert_eq!(table.columns, vec!["Component".to_string(), "Value".to_string()]);
        assert_eq!(table.row("Months to Payoff").unwrap()[1], "3");
        assert_eq!(table.row("Interest Rate").unwrap()[1], "12.00%");
        assert_eq!(table.row("Total Interest").unwrap()[1], "$16");
    }

    // =========================================================================
    // amortized_monthly_payment tests
    // =========================================================================

    #[test]
    fn standard_payment() {
        assert_eq!(
            amortized_monthly_payment(dec!(25000), dec!(0.06), 60),
            Ok(dec!(483.32))
        );
    }

    #[test]
    fn zero_rate_divides_evenly() {
        assert_eq!(amortized_monthly_payment(dec!(12000), dec!(0), 48), Ok(dec!(250)));
    }

    #[test]
    fn zero_months_is_rejected() {
        assert!(matches!(
            amortized_monthly_payment(dec!(12000), dec!(0.05), 0),
            Err(CarKeepError::Validation { field, .. }) if field == "months"
        ));
    }
}
