//! Scenario-versus-baseline cost comparison.
//!
//! Both sides are costed over the 36-month horizon:
//!
//! | Side | Total |
//! |------|-------|
//! | scenario | financing + Σ net property tax − trade-in equity |
//! | baseline | 36 × (payment + extra) + Σ net property tax |
//!
//! `cost_difference = scenario_total − baseline_total`; positive means the
//! scenario costs more.
//!
//! All inputs are validated and both state codes resolved before any table
//! is built. Components keep cent precision in [`CostBreakdown`]; the tables
//! are built from whole-dollar components so every total row is the exact
//! sum of its component rows after [`parse_currency`](super::currency::parse_currency).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculations::common::{checked_add, checked_sub, round_dollars};
use crate::calculations::currency::{format_currency, format_signed_currency};
use crate::calculations::financing::{FinancingCost, baseline_financing_cost, financing_cost};
use crate::calculations::property_tax::{PropertyTaxCalculator, PropertyTaxSchedule};
use crate::calculations::trade_in::{TradeInEquity, resolve_trade_in};
use crate::error::CarKeepError;
use crate::models::{
    Baseline, ComparisonResult, HORIZON_YEARS, NET_OUT_OF_POCKET, OperatingCosts, SUBTOTAL, Scenario,
    TOTAL_COST_DIFFERENCE, TOTAL_MONTHLY, Table,
};
use crate::registry::StateTaxRegistry;

pub const FINANCING_ROW: &str = "Lease/Loan Payment";
pub const PROPERTY_TAX_ROW: &str = "Property Tax";
pub const TRADE_IN_ROW: &str = "- Trade-In Equity";
pub const FINANCING_DIFFERENCE_ROW: &str = "Financing Difference";
pub const PROPERTY_TAX_DIFFERENCE_ROW: &str = "Property Tax Difference";
pub const TRADE_IN_DIFFERENCE_ROW: &str = "Trade-In Equity";

/// Cost of one side of a comparison, at cent precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub label: String,
    pub state_code: String,
    pub financing: FinancingCost,
    pub property_tax: PropertyTaxSchedule,
    pub trade_in: TradeInEquity,
    /// Financing plus net property tax.
    pub subtotal: Decimal,
    /// Subtotal less trade-in equity.
    pub net_out_of_pocket: Decimal,
    /// Running costs, kept out of the horizon totals.
    pub operating_costs: OperatingCosts,
}

impl CostBreakdown {
    /// Net out-of-pocket in whole dollars, as shown in the summary table.
    pub fn display_total(&self) -> Result<Decimal, CarKeepError> {
        Ok(DollarLedger::from_breakdown(self)?.net_out_of_pocket)
    }
}

/// Whether a scenario costs more or less than keeping the current vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    MoreExpensive,
    LessExpensive,
    SameCost,
}

impl Verdict {
    pub fn from_difference(difference: Decimal) -> Self {
        if difference > Decimal::ZERO {
            Self::MoreExpensive
        } else if difference < Decimal::ZERO {
            Self::LessExpensive
        } else {
            Self::SameCost
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MoreExpensive => "more expensive",
            Self::LessExpensive => "less expensive",
            Self::SameCost => "same cost",
        }
    }
}

/// Full outcome of comparing one scenario to the baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub key: String,
    pub description: String,
    pub scenario: CostBreakdown,
    pub baseline: CostBreakdown,
    /// Whole dollars, equal to the scenario's NET OUT-OF-POCKET cell.
    pub scenario_total: Decimal,
    /// Whole dollars, equal to the baseline's NET OUT-OF-POCKET cell.
    pub baseline_total: Decimal,
    /// `scenario_total − baseline_total`.
    pub cost_difference: Decimal,
    pub verdict: Verdict,
    pub results: ComparisonResult,
}

/// Whole-dollar figures that back the display tables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DollarLedger {
    financing: Decimal,
    property_tax: Decimal,
    subtotal: Decimal,
    trade_in_equity: Decimal,
    net_out_of_pocket: Decimal,
}

impl DollarLedger {
    fn from_breakdown(breakdown: &CostBreakdown) -> Result<Self, CarKeepError> {
        let financing = round_dollars(breakdown.financing.total_over_horizon);
        let property_tax = round_dollars(breakdown.property_tax.total_net);
        let trade_in_equity = round_dollars(breakdown.trade_in.net_equity);
        let subtotal = checked_add(financing, property_tax, "subtotal")?;
        let net_out_of_pocket = checked_sub(subtotal, trade_in_equity, "net out-of-pocket")?;
        Ok(Self {
            financing,
            property_tax,
            subtotal,
            trade_in_equity,
            net_out_of_pocket,
        })
    }
}

/// Compares scenarios against a baseline using one registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ScenarioComparator<'a> {
    registry: &'a StateTaxRegistry,
}

impl<'a> ScenarioComparator<'a> {
    pub fn new(registry: &'a StateTaxRegistry) -> Self {
        Self { registry }
    }

    /// Compares `scenario` to `baseline`.
    ///
    /// # Errors
    ///
    /// * [`CarKeepError::Validation`] if the baseline is missing or either
    ///   record is malformed.
    /// * [`CarKeepError::NotFound`] if either state code is not registered.
    /// * [`CarKeepError::Computation`] on arithmetic overflow.
    ///
    /// No table is built unless every check passes.
    pub fn compare(
        &self,
        scenario: &Scenario,
        baseline: Option<&Baseline>,
    ) -> Result<ScenarioComparison, CarKeepError> {
        let baseline =
            baseline.ok_or_else(|| CarKeepError::validation("baseline", "no baseline is configured"))?;
        scenario.validate()?;
        baseline.validate()?;

        let scenario_tax = PropertyTaxCalculator::for_state(self.registry, &scenario.state_code)?;
        let baseline_tax = PropertyTaxCalculator::for_state(self.registry, &baseline.state_code)?;

        let scenario_side =
            self.scenario_breakdown(scenario, scenario_tax.calculate(&scenario.vehicle)?)?;
        let baseline_side =
            self.baseline_breakdown(baseline, baseline_tax.calculate(&baseline.vehicle)?)?;

        let scenario_ledger = DollarLedger::from_breakdown(&scenario_side)?;
        let baseline_ledger = DollarLedger::from_breakdown(&baseline_side)?;
        let cost_difference = checked_sub(
            scenario_ledger.net_out_of_pocket,
            baseline_ledger.net_out_of_pocket,
            "cost difference",
        )?;

        let results = ComparisonResult {
            summary: summary_table(&scenario_side, &baseline_side, &scenario_ledger, &baseline_ledger),
            cost_difference: cost_difference_table(&scenario_ledger, &baseline_ledger, cost_difference)?,
            monthly_payment: monthly_payment_table(&scenario_side, &baseline_side),
        };
        let verdict = Verdict::from_difference(cost_difference);
        info!(
            scenario = %scenario.key,
            cost_difference = %cost_difference,
            verdict = verdict.as_str(),
            "scenario compared"
        );

        Ok(ScenarioComparison {
            key: scenario.key.clone(),
            description: scenario.description.clone(),
            scenario: scenario_side,
            baseline: baseline_side,
            scenario_total: scenario_ledger.net_out_of_pocket,
            baseline_total: baseline_ledger.net_out_of_pocket,
            cost_difference,
            verdict,
            results,
        })
    }

    /// Compares every scenario against the same baseline, in input order.
    /// Fails on the first scenario that cannot be compared.
    pub fn compare_all(
        &self,
        scenarios: &[Scenario],
        baseline: Option<&Baseline>,
    ) -> Result<Vec<ScenarioComparison>, CarKeepError> {
        scenarios
            .iter()
            .map(|scenario| self.compare(scenario, baseline))
            .collect()
    }

    /// Costs the baseline on its own, without any scenario.
    ///
    /// # Errors
    ///
    /// As for [`compare`](Self::compare), limited to the baseline.
    pub fn baseline_cost(
        &self,
        baseline: Option<&Baseline>,
    ) -> Result<CostBreakdown, CarKeepError> {
        let baseline =
            baseline.ok_or_else(|| CarKeepError::validation("baseline", "no baseline is configured"))?;
        baseline.validate()?;
        let tax = PropertyTaxCalculator::for_state(self.registry, &baseline.state_code)?;
        self.baseline_breakdown(baseline, tax.calculate(&baseline.vehicle)?)
    }

    fn scenario_breakdown(
        &self,
        scenario: &Scenario,
        property_tax: PropertyTaxSchedule,
    ) -> Result<CostBreakdown, CarKeepError> {
        let financing = financing_cost(&scenario.financing)?;
        let trade_in = resolve_trade_in(scenario.trade_in.as_ref())?;
        let side = breakdown(scenario.column_label(), &scenario.state_code, financing, property_tax, trade_in)?;
        Ok(CostBreakdown {
            operating_costs: scenario.operating_costs(),
            ..side
        })
    }

    fn baseline_breakdown(
        &self,
        baseline: &Baseline,
        property_tax: PropertyTaxSchedule,
    ) -> Result<CostBreakdown, CarKeepError> {
        let financing = baseline_financing_cost(&baseline.current_loan)?;
        let side = breakdown(
            baseline.column_label(),
            &baseline.state_code,
            financing,
            property_tax,
            TradeInEquity::default(),
        )?;
        Ok(CostBreakdown {
            operating_costs: baseline.operating_costs(),
            ..side
        })
    }
}

fn breakdown(
    label: String,
    state_code: &str,
    financing: FinancingCost,
    property_tax: PropertyTaxSchedule,
    trade_in: TradeInEquity,
) -> Result<CostBreakdown, CarKeepError> {
    let subtotal = checked_add(financing.total_over_horizon, property_tax.total_net, "subtotal")?;
    let net_out_of_pocket = checked_sub(subtotal, trade_in.net_equity, "net out-of-pocket")?;
    debug!(side = %label, subtotal = %subtotal, net = %net_out_of_pocket, "costed comparison side");
    Ok(CostBreakdown {
        label,
        state_code: state_code.to_ascii_uppercase(),
        financing,
        property_tax,
        trade_in,
        subtotal,
        net_out_of_pocket,
        operating_costs: OperatingCosts::default(),
    })
}

fn summary_table(
    scenario: &CostBreakdown,
    baseline: &CostBreakdown,
    scenario_ledger: &DollarLedger,
    baseline_ledger: &DollarLedger,
) -> Table {
    let mut table = Table::new(["Cost Category", scenario.label.as_str(), baseline.label.as_str()]);
    let rows: [(&str, fn(&DollarLedger) -> Decimal); 5] = [
        (FINANCING_ROW, |l| l.financing),
        (PROPERTY_TAX_ROW, |l| l.property_tax),
        (SUBTOTAL, |l| l.subtotal),
        (TRADE_IN_ROW, |l| -l.trade_in_equity),
        (NET_OUT_OF_POCKET, |l| l.net_out_of_pocket),
    ];
    for (label, value) in rows {
        table.push_row([
            label.to_string(),
            format_currency(value(scenario_ledger)),
            format_currency(value(baseline_ledger)),
        ]);
    }
    table
}

fn cost_difference_table(
    scenario: &DollarLedger,
    baseline: &DollarLedger,
    total: Decimal,
) -> Result<Table, CarKeepError> {
    let financing = checked_sub(scenario.financing, baseline.financing, "financing difference")?;
    let property_tax = checked_sub(scenario.property_tax, baseline.property_tax, "property tax difference")?;
    let equity = checked_sub(baseline.trade_in_equity, scenario.trade_in_equity, "equity difference")?;

    let mut table = Table::new(["Cost Component", "Amount"]);
    table.push_row([FINANCING_DIFFERENCE_ROW.to_string(), format_signed_currency(financing)]);
    table.push_row([PROPERTY_TAX_DIFFERENCE_ROW.to_string(), format_signed_currency(property_tax)]);
    table.push_row([TRADE_IN_DIFFERENCE_ROW.to_string(), format_signed_currency(equity)]);
    table.push_row([TOTAL_COST_DIFFERENCE.to_string(), format_signed_currency(total)]);
    Ok(table)
}

fn monthly_payment_table(
    scenario: &CostBreakdown,
    baseline: &CostBreakdown,
) -> Table {
    let mut table = Table::new(["Monthly Outflow", scenario.label.as_str(), baseline.label.as_str()]);
    for year in 1..=HORIZON_YEARS {
        let average = |side: &CostBreakdown| {
            format_currency(side.financing.average_monthly(year).unwrap_or(Decimal::ZERO))
        };
        table.push_row([format!("Year {year} Payment"), average(scenario), average(baseline)]);
    }
    table.push_row([
        TOTAL_MONTHLY.to_string(),
        format_currency(scenario.financing.monthly_cash_outflow),
        format_currency(baseline.financing.monthly_cash_outflow),
    ]);
    table
}
