use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::checked_add;
use crate::error::CarKeepError;
use crate::models::vehicle::non_negative;

/// How a scenario vehicle is paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Financing {
    Loan(LoanTerms),
    Lease(LeaseTerms),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub monthly_payment: Decimal,
    /// Term in months.
    pub loan_term: u32,
    #[serde(default)]
    pub principal_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseTerms {
    pub monthly_payment: Decimal,
    /// Term in months.
    pub lease_terms: u32,
}

impl Financing {
    pub fn monthly_payment(&self) -> Decimal {
        match self {
            Self::Loan(loan) => loan.monthly_payment,
            Self::Lease(lease) => lease.monthly_payment,
        }
    }

    /// Contract length in months.
    pub fn term_months(&self) -> u32 {
        match self {
            Self::Loan(loan) => loan.loan_term,
            Self::Lease(lease) => lease.lease_terms,
        }
    }

    /// `"Loan"` or `"Lease"`, used in table headers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Loan(_) => "Loan",
            Self::Lease(_) => "Lease",
        }
    }

    pub fn validate(
        &self,
        prefix: &str,
    ) -> Result<(), CarKeepError> {
        match self {
            Self::Loan(loan) => {
                non_negative(&format!("{prefix}.monthly_payment"), loan.monthly_payment)?;
                non_negative(&format!("{prefix}.principal_balance"), loan.principal_balance)?;
                positive_term(&format!("{prefix}.loan_term"), loan.loan_term)
            }
            Self::Lease(lease) => {
                non_negative(&format!("{prefix}.monthly_payment"), lease.monthly_payment)?;
                positive_term(&format!("{prefix}.lease_terms"), lease.lease_terms)
            }
        }
    }
}

/// The loan on the vehicle the owner already has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentLoan {
    pub monthly_payment: Decimal,
    pub principal_balance: Decimal,
    /// Annual rate as a fraction.
    pub interest_rate: Decimal,
    /// Voluntary amount paid on top of the scheduled payment each month.
    #[serde(default)]
    pub extra_payment: Decimal,
}

impl CurrentLoan {
    /// Scheduled payment plus any extra principal.
    pub fn monthly_outflow(&self) -> Result<Decimal, CarKeepError> {
        checked_add(self.monthly_payment, self.extra_payment, "baseline monthly outflow")
    }

    pub fn validate(
        &self,
        prefix: &str,
    ) -> Result<(), CarKeepError> {
        non_negative(&format!("{prefix}.monthly_payment"), self.monthly_payment)?;
        non_negative(&format!("{prefix}.principal_balance"), self.principal_balance)?;
        non_negative(&format!("{prefix}.extra_payment"), self.extra_payment)?;
        if self.interest_rate < Decimal::ZERO || self.interest_rate > Decimal::ONE {
            return Err(CarKeepError::validation(
                format!("{prefix}.interest_rate"),
                format!("must be between 0 and 1, got {}", self.interest_rate),
            ));
        }
        Ok(())
    }
}

fn positive_term(
    field: &str,
    months: u32,
) -> Result<(), CarKeepError> {
    if months == 0 {
        return Err(CarKeepError::validation(field, "must be at least one month"));
    }
    Ok(())
}
