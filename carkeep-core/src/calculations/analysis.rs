//! Cross-scenario summaries built from individual comparisons.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{checked_add, checked_sub};
use crate::calculations::comparison::{CostBreakdown, ScenarioComparison};
use crate::error::CarKeepError;
use crate::models::{ComparisonResult, Table};

/// A scenario singled out by [`CostAnalysis`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPick {
    pub key: String,
    pub description: String,
    pub amount: Decimal,
}

/// Monthly cost of one side including running costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCost {
    /// Scenario key, or `baseline`.
    pub key: String,
    pub description: String,
    pub payment: Decimal,
    pub insurance: Decimal,
    pub maintenance: Decimal,
    pub fuel: Decimal,
    pub total_monthly: Decimal,
    /// `total_monthly` minus the baseline's; negative is a saving.
    pub vs_baseline: Decimal,
}

impl MonthlyCost {
    fn of_side(
        key: &str,
        description: &str,
        side: &CostBreakdown,
        baseline_total: Option<Decimal>,
    ) -> Result<Self, CarKeepError> {
        let costs = &side.operating_costs;
        let payment = side.financing.monthly_cash_outflow;
        let total_monthly = checked_add(payment, costs.monthly_total()?, "total monthly cost")?;
        let vs_baseline = match baseline_total {
            Some(baseline) => checked_sub(total_monthly, baseline, "monthly cost versus baseline")?,
            None => Decimal::ZERO,
        };
        Ok(Self {
            key: key.to_string(),
            description: description.to_string(),
            payment,
            insurance: costs.insurance_monthly,
            maintenance: costs.maintenance_monthly,
            fuel: costs.fuel_monthly,
            total_monthly,
            vs_baseline,
        })
    }
}

/// Headline figures across every scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub scenario_count: usize,
    pub baseline_monthly: Decimal,
    /// Whole dollars, as shown in NET OUT-OF-POCKET.
    pub baseline_total: Decimal,
    /// Scenario with the smallest monthly outflow; first by key on ties.
    pub lowest_monthly: Option<ScenarioPick>,
    /// Scenario with the smallest net out-of-pocket; first by key on ties.
    pub best_net: Option<ScenarioPick>,
    /// `baseline_total − best_net.amount`; positive when the best scenario
    /// saves money.
    pub best_net_savings: Option<Decimal>,
    pub baseline_monthly_cost: MonthlyCost,
    /// Per scenario, cheapest total monthly cost first; ties by key.
    pub monthly_costs: Vec<MonthlyCost>,
    /// Baseline total monthly cost minus the cheapest scenario's.
    pub monthly_savings: Option<Decimal>,
}

impl CostAnalysis {
    /// Summarizes `comparisons` against the costed `baseline`.
    pub fn from_comparisons(
        baseline: &CostBreakdown,
        comparisons: &[ScenarioComparison],
    ) -> Result<Self, CarKeepError> {
        let baseline_total = baseline.display_total()?;

        let lowest_monthly = comparisons
            .iter()
            .min_by(|a, b| {
                a.scenario
                    .financing
                    .monthly_cash_outflow
                    .cmp(&b.scenario.financing.monthly_cash_outflow)
                    .then_with(|| a.key.cmp(&b.key))
            })
            .map(|c| pick(c, c.scenario.financing.monthly_cash_outflow));
        let best_net = comparisons
            .iter()
            .min_by(|a, b| {
                a.scenario_total
                    .cmp(&b.scenario_total)
                    .then_with(|| a.key.cmp(&b.key))
            })
            .map(|c| pick(c, c.scenario_total));
        let best_net_savings = best_net
            .as_ref()
            .map(|best| checked_sub(baseline_total, best.amount, "best net savings"))
            .transpose()?;

        let baseline_monthly_cost = MonthlyCost::of_side("baseline", &baseline.label, baseline, None)?;
        let mut monthly_costs = comparisons
            .iter()
            .map(|c| {
                MonthlyCost::of_side(
                    &c.key,
                    &c.description,
                    &c.scenario,
                    Some(baseline_monthly_cost.total_monthly),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        monthly_costs.sort_by(|a, b| {
            a.total_monthly
                .cmp(&b.total_monthly)
                .then_with(|| a.key.cmp(&b.key))
        });
        let monthly_savings = monthly_costs
            .first()
            .map(|cheapest| {
                checked_sub(
                    baseline_monthly_cost.total_monthly,
                    cheapest.total_monthly,
                    "monthly savings",
                )
            })
            .transpose()?;

        Ok(Self {
            scenario_count: comparisons.len(),
            baseline_monthly: baseline.financing.monthly_cash_outflow,
            baseline_total,
            lowest_monthly,
            best_net,
            best_net_savings,
            baseline_monthly_cost,
            monthly_costs,
            monthly_savings,
        })
    }
}

fn pick(
    comparison: &ScenarioComparison,
    amount: Decimal,
) -> ScenarioPick {
    ScenarioPick {
        key: comparison.key.clone(),
        description: comparison.description.clone(),
        amount,
    }
}

/// Every scenario's column side by side, one table per comparison table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonMatrix {
    pub summary: Table,
    pub cost_difference: Table,
    pub monthly_payment: Table,
}

impl ComparisonMatrix {
    /// Builds the matrix. Row labels come from the first comparison; summary
    /// and monthly tables end with a `Baseline` column.
    pub fn from_comparisons(comparisons: &[ScenarioComparison]) -> Self {
        Self {
            summary: merge(comparisons, |r| &r.summary, true),
            cost_difference: merge(comparisons, |r| &r.cost_difference, false),
            monthly_payment: merge(comparisons, |r| &r.monthly_payment, true),
        }
    }
}

fn merge(
    comparisons: &[ScenarioComparison],
    table_of: fn(&ComparisonResult) -> &Table,
    with_baseline: bool,
) -> Table {
    let Some(first) = comparisons.first().map(|c| table_of(&c.results)) else {
        return Table::default();
    };

    let mut columns = vec![first.columns.first().cloned().unwrap_or_default()];
    columns.extend(comparisons.iter().map(|c| c.key.clone()));
    if with_baseline {
        columns.push("Baseline".to_string());
    }
    let mut matrix = Table::new(columns);

    for row in &first.data {
        let Some(label) = row.first() else {
            continue;
        };
        let mut cells = vec![label.clone()];
        for comparison in comparisons {
            let cell = table_of(&comparison.results)
                .row(label)
                .and_then(|r| r.get(1))
                .cloned()
                .unwrap_or_default();
            cells.push(cell);
        }
        if with_baseline {
            cells.push(row.get(2).cloned().unwrap_or_default());
        }
        matrix.push_row(cells);
    }
    matrix
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::comparison::ScenarioComparator;
    use crate::models::{
        Baseline, CurrentLoan, Financing, LeaseTerms, LoanTerms, NET_OUT_OF_POCKET, OperatingCosts, Scenario,
        TOTAL_MONTHLY, Vehicle,
    };
    use crate::registry::StateTaxRegistry;

    fn vehicle(name: &str) -> Vehicle {
        Vehicle {
            name: name.to_string(),
            msrp: dec!(30000),
            current_value: dec!(30000),
            values_3yr: vec![dec!(0), dec!(0), dec!(0)],
            impairment: dec!(0),
            impairment_affects_taxes: false,
        }
    }

    fn baseline() -> Baseline {
        Baseline {
            description: "Keep".to_string(),
            state_code: "TX".to_string(),
            vehicle: vehicle("Current"),
            current_loan: CurrentLoan {
                monthly_payment: dec!(600),
                principal_balance: dec!(10000),
                interest_rate: dec!(0.05),
                extra_payment: dec!(0),
            },
            operating_costs: None,
        }
    }

    fn scenario(
        key: &str,
        financing: Financing,
    ) -> Scenario {
        Scenario {
            key: key.to_string(),
            description: format!("{key} description"),
            state_code: "TX".to_string(),
            vehicle: vehicle(key),
            financing,
            trade_in: None,
            operating_costs: None,
        }
    }

    fn comparisons() -> (CostBreakdown, Vec<ScenarioComparison>) {
        let registry = StateTaxRegistry::with_defaults();
        let comparator = ScenarioComparator::new(&registry);
        let scenarios = vec![
            // 450 × 36 = 16,200
            scenario(
                "cheap_lease",
                Financing::Lease(LeaseTerms {
                    monthly_payment: dec!(450),
                    lease_terms: 36,
                }),
            ),
            // 700 × 12 = 8,400
            scenario(
                "short_loan",
                Financing::Loan(LoanTerms {
                    monthly_payment: dec!(700),
                    loan_term: 12,
                    principal_balance: dec!(8000),
                }),
            ),
        ];
        let baseline = baseline();
        (
            comparator.baseline_cost(Some(&baseline)).unwrap(),
            comparator.compare_all(&scenarios, Some(&baseline)).unwrap(),
        )
    }

    #[test]
    fn analysis_picks_lowest_monthly_and_best_net() {
        let (baseline, comparisons) = comparisons();

        let analysis = CostAnalysis::from_comparisons(&baseline, &comparisons).unwrap();

        assert_eq!(analysis.scenario_count, 2);
        assert_eq!(analysis.baseline_monthly, dec!(600));
        assert_eq!(analysis.baseline_total, dec!(21600));
        assert_eq!(
            analysis.lowest_monthly,
            Some(ScenarioPick {
                key: "cheap_lease".to_string(),
                description: "cheap_lease description".to_string(),
                amount: dec!(450),
            })
        );
        assert_eq!(analysis.best_net.as_ref().map(|p| p.key.as_str()), Some("short_loan"));
        assert_eq!(analysis.best_net_savings, Some(dec!(13200)));
    }

    #[test]
    fn monthly_costs_include_running_costs() {
        let registry = StateTaxRegistry::with_defaults();
        let comparator = ScenarioComparator::new(&registry);
        let mut pricey_insurance = scenario(
            "cheap_lease",
            Financing::Lease(LeaseTerms {
                monthly_payment: dec!(450),
                lease_terms: 36,
            }),
        );
        pricey_insurance.operating_costs = Some(OperatingCosts {
            insurance_monthly: dec!(400),
            ..OperatingCosts::default()
        });
        let plain_loan = scenario(
            "short_loan",
            Financing::Loan(LoanTerms {
                monthly_payment: dec!(700),
                loan_term: 12,
                principal_balance: dec!(8000),
            }),
        );
        let baseline = baseline();
        let comparisons = comparator
            .compare_all(&[pricey_insurance, plain_loan], Some(&baseline))
            .unwrap();

        let analysis =
            CostAnalysis::from_comparisons(&comparator.baseline_cost(Some(&baseline)).unwrap(), &comparisons)
                .unwrap();

        // 600 + 100 + 50 + 150
        assert_eq!(analysis.baseline_monthly_cost.total_monthly, dec!(900));
        assert_eq!(analysis.baseline_monthly_cost.vs_baseline, dec!(0));
        let order: Vec<_> = analysis
            .monthly_costs
            .iter()
            .map(|m| (m.key.as_str(), m.total_monthly, m.vs_baseline))
            .collect();
        assert_eq!(
            order,
            vec![("short_loan", dec!(1000), dec!(100)), ("cheap_lease", dec!(1050), dec!(150))]
        );
        assert_eq!(analysis.monthly_costs[1].insurance, dec!(400));
        assert_eq!(analysis.monthly_savings, Some(dec!(-100)));
        // Payment-only pick is unaffected by running costs.
        assert_eq!(analysis.lowest_monthly.map(|p| p.key), Some("cheap_lease".to_string()));
    }

    #[test]
    fn analysis_of_no_scenarios_has_no_picks() {
        let (baseline, _) = comparisons();

        let analysis = CostAnalysis::from_comparisons(&baseline, &[]).unwrap();

        assert_eq!(analysis.scenario_count, 0);
        assert_eq!(analysis.lowest_monthly, None);
        assert_eq!(analysis.best_net_savings, None);
        assert!(analysis.monthly_costs.is_empty());
        assert_eq!(analysis.monthly_savings, None);
    }

    #[test]
    fn matrix_has_one_column_per_scenario() {
        let (_, comparisons) = comparisons();

        let matrix = ComparisonMatrix::from_comparisons(&comparisons);

        assert_eq!(
            matrix.summary.columns,
            vec![
                "Cost Category".to_string(),
                "cheap_lease".to_string(),
                "short_loan".to_string(),
                "Baseline".to_string(),
            ]
        );
        assert_eq!(
            matrix.summary.row(NET_OUT_OF_POCKET).unwrap(),
            &[
                "NET OUT-OF-POCKET".to_string(),
                "$16,200".to_string(),
                "$8,400".to_string(),
                "$21,600".to_string(),
            ][..]
        );
        assert_eq!(matrix.monthly_payment.row(TOTAL_MONTHLY).unwrap()[2], "$700");
    }

    #[test]
    fn matrix_cost_difference_has_no_baseline_column() {
        let (_, comparisons) = comparisons();

        let matrix = ComparisonMatrix::from_comparisons(&comparisons);

        assert_eq!(matrix.cost_difference.columns.len(), 3);
        assert_eq!(matrix.cost_difference.data.last().unwrap()[1], "-$5,400");
    }

    #[test]
    fn empty_matrix_is_empty() {
        assert_eq!(ComparisonMatrix::from_comparisons(&[]), ComparisonMatrix::default());
    }
}
