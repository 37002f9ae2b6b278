//! Cost calculations for comparing a replacement vehicle against keeping
//! the current one.
//!
//! Calculators are pure and synchronous. State tax lookups go through a
//! [`StateTaxRegistry`](crate::registry::StateTaxRegistry) snapshot passed
//! in by the caller.

pub mod amortization;
pub mod analysis;
pub mod common;
pub mod comparison;
pub mod currency;
pub mod depreciation;
pub mod financing;
pub mod property_tax;
pub mod trade_in;

pub use amortization::{LoanPayoff, amortize, amortized_monthly_payment};
pub use analysis::{ComparisonMatrix, CostAnalysis, MonthlyCost, ScenarioPick};
pub use comparison::{CostBreakdown, ScenarioComparator, ScenarioComparison, Verdict};
pub use currency::{CurrencyParseError, format_currency, format_percentage, format_signed_currency, parse_currency};
pub use depreciation::depreciation_schedule;
pub use financing::{FinancingCost, HORIZON_MONTHS, baseline_financing_cost, financing_cost};
pub use property_tax::{PropertyTaxCalculator, PropertyTaxSchedule, PropertyTaxYear};
pub use trade_in::{TradeInEquity, resolve_trade_in};
