//! Command definitions and dispatch for the `carkeep` binary.
//!
//! Every command renders to a `String`, either as aligned text tables or as
//! pretty-printed JSON, so `main` only has to print the result.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use carkeep_core::calculations::{
    CostAnalysis, ScenarioComparison, ScenarioPick, Verdict, amortized_monthly_payment, depreciation_schedule,
    format_currency, format_percentage, format_signed_currency,
};
use carkeep_core::db::{CarKeepRepository, DbConfig, RepositoryRegistry};
use carkeep_core::{
    CarKeepError, CarKeepService, ReliefCapBasis, StateTaxConfig, Table,
};
use carkeep_data::{export_comparison_csv, export_matrix_csv};
use carkeep_db_sqlite::SqliteRepositoryFactory;
use clap::{Subcommand, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::utils::{amount_arg, percentage_arg, render_table};

/// Build the repository registry with all available backends.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Opens the repository described by `config`.
pub async fn open_repository(config: &DbConfig) -> Result<Box<dyn CarKeepRepository>> {
    debug!("connecting to {} backend", config.backend);
    build_registry()
        .create(config)
        .await
        .with_context(|| format!("Failed to open {} database '{}'", config.backend, config.connection_string))
}

// ─── command definitions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage per-state property tax configurations.
    #[command(subcommand)]
    States(StatesCommand),

    /// Manage saved scenarios.
    #[command(subcommand)]
    Scenarios(ScenariosCommand),

    /// Inspect the vehicle being kept.
    #[command(subcommand)]
    Baseline(BaselineCommand),

    /// Compare one scenario against the baseline.
    Compare {
        key: String,

        /// Also write the three tables as CSV files into this directory.
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },

    /// Compare every scenario against the baseline.
    CompareAll,

    /// Headline figures across every scenario.
    Analysis,

    /// Side-by-side tables with one column per scenario.
    Matrix {
        /// Also write the three tables as CSV files into this directory.
        #[arg(long)]
        csv_dir: Option<PathBuf>,
    },

    /// Pay down the baseline loan over the comparison horizon.
    Payoff,

    /// Level monthly payment for a new loan.
    LoanPayment {
        /// Amount financed, e.g. `30,000`.
        #[arg(long, value_parser = amount_arg)]
        principal: Decimal,

        /// Annual interest rate in percent, e.g. `4.39`.
        #[arg(long, value_parser = percentage_arg)]
        rate: Decimal,

        /// Term in months.
        #[arg(long)]
        months: u32,
    },

    /// Project a three-year value trajectory.
    Depreciation {
        /// Starting value, e.g. `21,000`.
        #[arg(long, value_parser = amount_arg)]
        value: Decimal,

        /// Yearly depreciation in percent, e.g. `10,10,10`.
        #[arg(long, value_parser = percentage_arg, value_delimiter = ',', required = true)]
        rates: Vec<Decimal>,
    },
}

#[derive(Debug, Subcommand)]
pub enum StatesCommand {
    /// List every configured state.
    List,

    /// Show one state.
    Get { code: String },

    /// Create or update a state. Omitted values keep their stored setting,
    /// or default to zero for a new state.
    Set {
        code: String,

        /// Display name; required for a new state.
        #[arg(long)]
        name: Option<String>,

        /// Annual property tax rate in percent, e.g. `4.57`.
        #[arg(long, value_parser = percentage_arg)]
        rate: Option<Decimal>,

        /// Relief in percent of the eligible amount, e.g. `51`.
        #[arg(long, value_parser = percentage_arg)]
        relief: Option<Decimal>,

        /// Relief cap in dollars.
        #[arg(long, value_parser = amount_arg)]
        cap: Option<Decimal>,

        /// `relief_amount` or `taxable_value`.
        #[arg(long)]
        basis: Option<String>,
    },

    /// Delete a state. VA, TX and CA cannot be deleted.
    Delete { code: String },
}

#[derive(Debug, Subcommand)]
pub enum ScenariosCommand {
    /// List every scenario.
    List,

    /// Show one scenario as JSON.
    Show { key: String },

    /// Copy a scenario under a new `{key}_copy` key.
    Duplicate { key: String },

    /// Delete a scenario.
    Delete { key: String },
}

#[derive(Debug, Subcommand)]
pub enum BaselineCommand {
    /// Show the baseline as JSON.
    Show,
}

// ─── dispatch ────────────────────────────────────────────────────────────────

/// Runs `command` against `repo` and returns what should be printed.
pub async fn run(
    repo: &dyn CarKeepRepository,
    command: &Command,
    format: OutputFormat,
) -> Result<String> {
    let service = CarKeepService::new(repo);
    match command {
        Command::States(cmd) => run_states(&service, cmd, format).await,
        Command::Scenarios(cmd) => run_scenarios(&service, cmd, format).await,
        Command::Baseline(BaselineCommand::Show) => {
            let baseline = service.baseline().await?;
            to_json(&baseline)
        }
        Command::Compare { key, csv_dir } => {
            let comparison = service.compare(key).await?;
            let mut out = emit(format, &comparison, || comparison_text(&comparison))?;
            if let Some(dir) = csv_dir {
                let written = export_comparison_csv(&comparison, dir)
                    .with_context(|| format!("Failed to export to '{}'", dir.display()))?;
                info!(files = written.len(), dir = %dir.display(), "comparison exported");
                if format == OutputFormat::Text {
                    out.push_str(&written_text(&written));
                }
            }
            Ok(out)
        }
        Command::CompareAll => {
            let comparisons = service.compare_all().await?;
            emit(format, &comparisons, || render_table(&overview_table(&comparisons)))
        }
        Command::Analysis => {
            let analysis = service.analysis().await?;
            emit(format, &analysis, || {
                let pick = |p: &Option<ScenarioPick>| match p {
                    Some(p) => format!("{} ({})", p.key, format_currency(p.amount)),
                    None => "-".to_string(),
                };
                let mut table = Table::new(["Metric", "Value"]);
                table.push_row(["Scenarios".to_string(), analysis.scenario_count.to_string()]);
                table.push_row(["Baseline Monthly".to_string(), format_currency(analysis.baseline_monthly)]);
                table.push_row(["Baseline Net Out-of-Pocket".to_string(), format_currency(analysis.baseline_total)]);
                table.push_row(["Lowest Monthly".to_string(), pick(&analysis.lowest_monthly)]);
                table.push_row(["Best Net Out-of-Pocket".to_string(), pick(&analysis.best_net)]);
                table.push_row([
                    "Savings vs Baseline".to_string(),
                    analysis
                        .best_net_savings
                        .map(format_signed_currency)
                        .unwrap_or_else(|| "-".to_string()),
                ]);
                table.push_row([
                    "Monthly Savings (with running costs)".to_string(),
                    analysis
                        .monthly_savings
                        .map(format_signed_currency)
                        .unwrap_or_else(|| "-".to_string()),
                ]);
                format!("{}\n{}", render_table(&table), render_table(&monthly_cost_table(&analysis)))
            })
        }
        Command::Matrix { csv_dir } => {
            let matrix = service.matrix().await?;
            let mut out = emit(format, &matrix, || {
                [&matrix.summary, &matrix.cost_difference, &matrix.monthly_payment]
                    .into_iter()
                    .map(render_table)
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            if let Some(dir) = csv_dir {
                let written = export_matrix_csv(&matrix, dir)
                    .with_context(|| format!("Failed to export to '{}'", dir.display()))?;
                if format == OutputFormat::Text {
                    out.push_str(&written_text(&written));
                }
            }
            Ok(out)
        }
        Command::Payoff => {
            let payoff = service.baseline_payoff().await?;
            emit(format, &payoff, || render_table(&payoff.to_table()))
        }
        Command::LoanPayment {
            principal,
            rate,
            months,
        } => {
            let payment = amortized_monthly_payment(*principal, *rate, *months)?;
            emit(format, &json!({ "monthly_payment": payment }), || {
                format!("Monthly payment: ${payment:.2}\n")
            })
        }
        Command::Depreciation { value, rates } => {
            let values = depreciation_schedule(*value, rates)?;
            emit(format, &values, || {
                let mut table = Table::new(["Year", "Value"]);
                for (year, value) in values.iter().enumerate() {
                    table.push_row([format!("Year {}", year + 1), format_currency(*value)]);
                }
                render_table(&table)
            })
        }
    }
}

async fn run_states(
    service: &CarKeepService<'_>,
    command: &StatesCommand,
    format: OutputFormat,
) -> Result<String> {
    match command {
        StatesCommand::List => {
            let states = service.state_taxes().await?;
            emit(format, &states, || render_table(&states_table(states.values())))
        }
        StatesCommand::Get { code } => {
            let state = service.state_tax(code).await?;
            emit(format, &state, || render_table(&states_table([&state])))
        }
        StatesCommand::Set {
            code,
            name,
            rate,
            relief,
            cap,
            basis,
        } => {
            let existing = match service.state_tax(code).await {
                Ok(config) => Some(config),
                Err(CarKeepError::NotFound { .. }) => None,
                Err(e) => return Err(e.into()),
            };
            let relief_cap_basis = match basis {
                Some(basis) => match ReliefCapBasis::parse(basis) {
                    Some(parsed) => parsed,
                    None => bail!("invalid relief cap basis '{basis}' (expected relief_amount or taxable_value)"),
                },
                None => existing.as_ref().map(|c| c.relief_cap_basis).unwrap_or_default(),
            };
            let state_name = match (name, &existing) {
                (Some(name), _) => name.clone(),
                (None, Some(existing)) => existing.state_name.clone(),
                (None, None) => bail!("--name is required when adding state '{code}'"),
            };
            let current = |pick: fn(&StateTaxConfig) -> Decimal| existing.as_ref().map(pick).unwrap_or_default();

            let saved = service
                .upsert_state_tax(StateTaxConfig {
                    state_code: code.clone(),
                    state_name,
                    property_tax_rate: rate.unwrap_or_else(|| current(|c| c.property_tax_rate)),
                    pptra_relief: relief.unwrap_or_else(|| current(|c| c.pptra_relief)),
                    relief_cap: cap.unwrap_or_else(|| current(|c| c.relief_cap)),
                    relief_cap_basis,
                })
                .await?;
            emit(format, &saved, || render_table(&states_table([&saved])))
        }
        StatesCommand::Delete { code } => {
            service.delete_state_tax(code).await?;
            emit(format, &json!({ "deleted": code.to_ascii_uppercase() }), || {
                format!("Deleted state {}\n", code.to_ascii_uppercase())
            })
        }
    }
}

async fn run_scenarios(
    service: &CarKeepService<'_>,
    command: &ScenariosCommand,
    format: OutputFormat,
) -> Result<String> {
    match command {
        ScenariosCommand::List => {
            let scenarios = service.scenarios().await?;
            emit(format, &scenarios, || {
                let mut table = Table::new(["Key", "Description", "State", "Vehicle", "Financing", "Monthly", "Term"]);
                for s in &scenarios {
                    table.push_row([
                        s.key.clone(),
                        s.description.clone(),
                        s.state_code.clone(),
                        s.vehicle.name.clone(),
                        s.financing.label().to_string(),
                        format_currency(s.financing.monthly_payment()),
                        format!("{} mo", s.financing.term_months()),
                    ]);
                }
                render_table(&table)
            })
        }
        ScenariosCommand::Show { key } => to_json(&service.scenario(key).await?),
        ScenariosCommand::Duplicate { key } => {
            let copy = service.duplicate_scenario(key).await?;
            emit(format, &copy, || format!("Created scenario {}\n", copy.key))
        }
        ScenariosCommand::Delete { key } => {
            service.delete_scenario(key).await?;
            emit(format, &json!({ "deleted": key }), || format!("Deleted scenario {key}\n"))
        }
    }
}

// ─── rendering ───────────────────────────────────────────────────────────────

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    out.push('\n');
    Ok(out)
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce() -> String,
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(text()),
        OutputFormat::Json => to_json(value),
    }
}

fn states_table<'a>(states: impl IntoIterator<Item = &'a StateTaxConfig>) -> Table {
    let mut table = Table::new(["State", "Name", "Property Tax Rate", "Relief", "Relief Cap", "Cap Basis"]);
    for state in states {
        table.push_row([
            state.state_code.clone(),
            state.state_name.clone(),
            format_percentage(state.property_tax_rate),
            format_percentage(state.pptra_relief),
            format_currency(state.relief_cap),
            state.relief_cap_basis.as_str().to_string(),
        ]);
    }
    table
}

fn comparison_text(comparison: &ScenarioComparison) -> String {
    let results = &comparison.results;
    let mut out = format!("{} ({})\n\n", comparison.description, comparison.key);
    for table in [&results.summary, &results.cost_difference, &results.monthly_payment] {
        out.push_str(&render_table(table));
        out.push('\n');
    }
    out.push_str(&verdict_line(comparison));
    out
}

fn verdict_line(comparison: &ScenarioComparison) -> String {
    let amount = format_currency(comparison.cost_difference.abs());
    match comparison.verdict {
        Verdict::SameCost => {
            "Same cost as keeping the current vehicle.\n".to_string()
        }
        verdict => format!(
            "{amount} {} than keeping the current vehicle over three years.\n",
            verdict.as_str()
        ),
    }
}

fn monthly_cost_table(analysis: &CostAnalysis) -> Table {
    let mut table = Table::new(["Monthly Cost", "Payment", "Insurance", "Maintenance", "Fuel", "Total", "vs Baseline"]);
    let rows = std::iter::once(&analysis.baseline_monthly_cost).chain(&analysis.monthly_costs);
    for cost in rows {
        table.push_row([
            cost.key.clone(),
            format_currency(cost.payment),
            format_currency(cost.insurance),
            format_currency(cost.maintenance),
            format_currency(cost.fuel),
            format_currency(cost.total_monthly),
            format_signed_currency(cost.vs_baseline),
        ]);
    }
    table
}

fn overview_table(comparisons: &[ScenarioComparison]) -> Table {
    let mut table = Table::new(["Scenario", "Net Out-of-Pocket", "Difference", "Verdict"]);
    for comparison in comparisons {
        table.push_row([
            comparison.key.clone(),
            format_currency(comparison.scenario_total),
            format_signed_currency(comparison.cost_difference),
            comparison.verdict.as_str().to_string(),
        ]);
    }
    table
}

fn written_text(paths: &[PathBuf]) -> String {
    let mut out = format!("\nWrote {} CSV files:\n", paths.len());
    for path in paths {
        out.push_str(&format!("  {}\n", path.display()));
    }
    out
}

#[cfg(test)]
mod tests {
    use carkeep_core::{Financing, LeaseTerms, LoanTerms, Scenario, TradeIn, Vehicle};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        TestCli::try_parse_from(std::iter::once("carkeep").chain(args.iter().copied()))
            .expect("arguments should parse")
            .command
    }

    async fn seeded_repo() -> Box<dyn CarKeepRepository> {
        open_repository(&DbConfig::new("sqlite", ":memory:"))
            .await
            .expect("in-memory repository")
    }

    fn vehicle(name: &str) -> Vehicle {
        Vehicle {
            name: name.to_string(),
            msrp: dec!(45000),
            current_value: dec!(45000),
            values_3yr: vec![dec!(40000), dec!(34000), dec!(30000)],
            impairment: dec!(0),
            impairment_affects_taxes: false,
        }
    }

    async fn add_scenarios(repo: &dyn CarKeepRepository) {
        let service = CarKeepService::new(repo);
        service
            .create_scenario(Scenario {
                key: "model_y_tx".to_string(),
                description: "Model Y loan in Texas".to_string(),
                state_code: "TX".to_string(),
                vehicle: vehicle("Model Y"),
                financing: Financing::Loan(LoanTerms {
                    monthly_payment: dec!(500),
                    loan_term: 60,
                    principal_balance: dec!(30000),
                }),
                trade_in: Some(TradeIn {
                    trade_in_value: dec!(18000),
                    loan_balance: dec!(15000),
                    incentives: dec!(2000),
                }),
                operating_costs: None,
            })
            .await
            .unwrap();
        service
            .create_scenario(Scenario {
                key: "lucid_lease".to_string(),
                description: "Lucid Air lease".to_string(),
                state_code: "VA".to_string(),
                vehicle: vehicle("Lucid Air"),
                financing: Financing::Lease(LeaseTerms {
                    monthly_payment: dec!(368),
                    lease_terms: 36,
                }),
                trade_in: None,
                operating_costs: None,
            })
            .await
            .unwrap();
    }

    // ── argument parsing ─────────────────────────────────────────────────

    #[test]
    fn states_set_takes_percentages() {
        let Command::States(StatesCommand::Set { rate, relief, cap, .. }) =
            parse(&["states", "set", "md", "--rate", "1.11", "--relief", "25%", "--cap", "1,000"])
        else {
            panic!("expected states set");
        };

        assert_eq!(rate, Some(dec!(0.0111)));
        assert_eq!(relief, Some(dec!(0.25)));
        assert_eq!(cap, Some(dec!(1000)));
    }

    #[test]
    fn depreciation_splits_rates() {
        let Command::Depreciation { value, rates } =
            parse(&["depreciation", "--value", "21,000", "--rates", "10,10,10"])
        else {
            panic!("expected depreciation");
        };

        assert_eq!(value, dec!(21000));
        assert_eq!(rates, vec![dec!(0.10), dec!(0.10), dec!(0.10)]);
    }

    #[test]
    fn bad_amount_is_a_parse_error() {
        let result = TestCli::try_parse_from(["carkeep", "loan-payment", "--principal", "lots", "--rate", "6", "--months", "60"]);

        assert!(result.is_err());
    }

    // ── states ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn states_list_shows_seeded_states() {
        let repo = seeded_repo().await;

        let out = run(&*repo, &parse(&["states", "list"]), OutputFormat::Text).await.unwrap();

        let codes: Vec<&str> = out.lines().skip(2).filter_map(|l| l.split_whitespace().next()).collect();
        assert_eq!(codes, vec!["CA", "TX", "VA"]);
        assert!(out.contains("4.57%"), "got:\n{out}");
    }

    #[tokio::test]
    async fn states_set_adds_then_updates() {
        let repo = seeded_repo().await;

        run(
            &*repo,
            &parse(&["states", "set", "md", "--name", "Maryland", "--rate", "1.11"]),
            OutputFormat::Text,
        )
        .await
        .unwrap();
        run(&*repo, &parse(&["states", "set", "MD", "--cap", "1000"]), OutputFormat::Text)
            .await
            .unwrap();

        let md = repo.get_state_tax("MD").await.unwrap();
        assert_eq!(md.state_name, "Maryland");
        assert_eq!(md.property_tax_rate, dec!(0.0111));
        assert_eq!(md.relief_cap, dec!(1000));
        assert_eq!(md.relief_cap_basis, ReliefCapBasis::ReliefAmount);
    }

    #[tokio::test]
    async fn states_set_new_state_needs_a_name() {
        let repo = seeded_repo().await;

        let result = run(&*repo, &parse(&["states", "set", "OR", "--rate", "1"]), OutputFormat::Text).await;

        assert!(result.is_err());
        assert!(repo.get_state_tax("OR").await.is_err());
    }

    #[tokio::test]
    async fn states_delete_protected() {
        let repo = seeded_repo().await;

        let err = run(&*repo, &parse(&["states", "delete", "va"]), OutputFormat::Text)
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<CarKeepError>(),
            Some(&CarKeepError::ProtectedRecord("VA".to_string()))
        );
    }

    // ── scenarios & comparisons ──────────────────────────────────────────

    #[tokio::test]
    async fn scenarios_list_and_duplicate() {
        let repo = seeded_repo().await;
        add_scenarios(&*repo).await;

        let out = run(&*repo, &parse(&["scenarios", "duplicate", "lucid_lease"]), OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, "Created scenario lucid_lease_copy\n");

        let list = run(&*repo, &parse(&["scenarios", "list"]), OutputFormat::Json).await.unwrap();
        let keys: Vec<String> = serde_json::from_str::<Vec<Scenario>>(&list)
            .unwrap()
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["lucid_lease", "lucid_lease_copy", "model_y_tx"]);
    }

    #[tokio::test]
    async fn compare_renders_tables_and_verdict() {
        let repo = seeded_repo().await;
        add_scenarios(&*repo).await;

        let out = run(&*repo, &parse(&["compare", "model_y_tx"]), OutputFormat::Text)
            .await
            .unwrap();

        assert!(out.starts_with("Model Y loan in Texas (model_y_tx)\n"), "got:\n{out}");
        for label in ["NET OUT-OF-POCKET", "TOTAL COST DIFFERENCE", "TOTAL MONTHLY"] {
            assert!(out.contains(label), "missing {label} in:\n{out}");
        }
        assert!(out.contains("than keeping the current vehicle"), "got:\n{out}");
    }

    #[tokio::test]
    async fn compare_json_round_trips() {
        let repo = seeded_repo().await;
        add_scenarios(&*repo).await;

        let out = run(&*repo, &parse(&["compare", "model_y_tx"]), OutputFormat::Json)
            .await
            .unwrap();

        let comparison: ScenarioComparison = serde_json::from_str(&out).unwrap();
        assert_eq!(comparison.key, "model_y_tx");
        assert_eq!(comparison.scenario_total, dec!(13000));
    }

    #[tokio::test]
    async fn compare_writes_csv_files() {
        let repo = seeded_repo().await;
        add_scenarios(&*repo).await;
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_string_lossy().into_owned();

        let out = run(
            &*repo,
            &parse(&["compare", "lucid_lease", "--csv-dir", &dir_arg]),
            OutputFormat::Text,
        )
        .await
        .unwrap();

        assert!(out.contains("Wrote 3 CSV files"), "got:\n{out}");
        assert!(dir.path().join("lucid_lease_monthly_payment_comparison.csv").exists());
    }

    #[tokio::test]
    async fn compare_unknown_scenario_is_not_found() {
        let repo = seeded_repo().await;

        let err = run(&*repo, &parse(&["compare", "nope"]), OutputFormat::Text)
            .await
            .unwrap_err();

        assert_eq!(err.downcast_ref::<CarKeepError>().map(CarKeepError::status_code), Some(404));
    }

    #[tokio::test]
    async fn matrix_has_a_column_per_scenario() {
        let repo = seeded_repo().await;
        add_scenarios(&*repo).await;

        let out = run(&*repo, &parse(&["matrix"]), OutputFormat::Text).await.unwrap();

        let header = out.lines().next().unwrap();
        assert!(header.contains("lucid_lease") && header.contains("model_y_tx"), "got {header}");
        assert!(header.trim_end().ends_with("Baseline"), "got {header}");
    }

    #[tokio::test]
    async fn analysis_with_no_scenarios() {
        let repo = seeded_repo().await;

        let out = run(&*repo, &parse(&["analysis"]), OutputFormat::Text).await.unwrap();

        assert!(out.contains("Scenarios"), "got:\n{out}");
        assert!(out.lines().any(|l| l.starts_with("Lowest Monthly") && l.ends_with('-')), "got:\n{out}");
    }

    #[tokio::test]
    async fn analysis_lists_monthly_costs_with_running_costs() {
        let repo = seeded_repo().await;
        add_scenarios(&*repo).await;

        let out = run(&*repo, &parse(&["analysis"]), OutputFormat::Text).await.unwrap();

        // 650 payment + 300 default running costs
        assert!(
            out.lines().any(|l| l.starts_with("baseline") && l.contains("$950")),
            "got:\n{out}"
        );
        assert!(
            out.lines().any(|l| l.starts_with("lucid_lease") && l.ends_with("-$282")),
            "got:\n{out}"
        );
        assert!(
            out.lines()
                .any(|l| l.starts_with("Monthly Savings (with running costs)") && l.ends_with("+$282")),
            "got:\n{out}"
        );
    }

    // ── calculators ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn payoff_of_seeded_baseline() {
        let repo = seeded_repo().await;

        let out = run(&*repo, &parse(&["payoff"]), OutputFormat::Text).await.unwrap();

        assert!(out.contains("Months to Payoff"), "got:\n{out}");
        assert!(out.contains("$9,910"), "got:\n{out}");
    }

    #[tokio::test]
    async fn loan_payment() {
        let repo = seeded_repo().await;

        let out = run(
            &*repo,
            &parse(&["loan-payment", "--principal", "25000", "--rate", "6", "--months", "60"]),
            OutputFormat::Text,
        )
        .await
        .unwrap();

        assert_eq!(out, "Monthly payment: $483.32\n");
    }

    #[tokio::test]
    async fn depreciation_table() {
        let repo = seeded_repo().await;

        let out = run(
            &*repo,
            &parse(&["depreciation", "--value", "21000", "--rates", "10,10,10"]),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        let values: Vec<Decimal> = serde_json::from_str(&out).unwrap();
        assert_eq!(values, vec![dec!(18900), dec!(17010), dec!(15309)]);
    }
}
