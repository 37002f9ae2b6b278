mod financing;
mod operating_costs;
mod scenario;
mod state_tax;
mod table;
mod trade_in;
mod vehicle;

pub use financing::{CurrentLoan, Financing, LeaseTerms, LoanTerms};
pub use operating_costs::OperatingCosts;
pub use scenario::{Baseline, Scenario};
pub use state_tax::{ReliefCapBasis, StateTaxConfig, normalize_state_code, validate_state_code};
pub use table::{
    ComparisonResult, NET_OUT_OF_POCKET, SUBTOTAL, TOTAL_COST_DIFFERENCE, TOTAL_MONTHLY, Table,
};
pub use trade_in::TradeIn;
pub use vehicle::{HORIZON_YEARS, Vehicle};
