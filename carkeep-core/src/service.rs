//! Administrative and comparison operations over a repository.
//!
//! Every comparison builds its own [`StateTaxRegistry`] from the stored rows
//! instead of sharing one across calls. The registry, scenario and baseline
//! are separate repository reads, not one transaction: a write that lands
//! between them is seen by the later reads only.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::calculations::amortization::LoanPayoff;
use crate::calculations::analysis::{ComparisonMatrix, CostAnalysis};
use crate::calculations::comparison::{ScenarioComparator, ScenarioComparison};
use crate::db::CarKeepRepository;
use crate::error::{CarKeepError, RecordKind};
use crate::models::{Baseline, Scenario, StateTaxConfig, normalize_state_code, validate_state_code};
use crate::registry::{StateTaxRegistry, is_protected};

const BASELINE_KEY: &str = "baseline";

pub struct CarKeepService<'a> {
    repo: &'a dyn CarKeepRepository,
}

impl<'a> CarKeepService<'a> {
    pub fn new(repo: &'a dyn CarKeepRepository) -> Self {
        Self { repo }
    }

    /// Snapshot of every stored state tax configuration.
    pub async fn registry(&self) -> Result<StateTaxRegistry, CarKeepError> {
        let configs = self.repo.list_state_taxes().await?;
        debug!(count = configs.len(), "loaded state tax registry");
        Ok(StateTaxRegistry::from_configs(configs))
    }

    // =========================================================================
    // State taxes
    // =========================================================================

    pub async fn state_tax(
        &self,
        code: &str,
    ) -> Result<StateTaxConfig, CarKeepError> {
        validate_state_code("state_code", code)?;
        let code = normalize_state_code(code);
        self.repo
            .get_state_tax(&code)
            .await
            .map_err(|e| CarKeepError::from_repository(e, RecordKind::StateTax, &code))
    }

    /// All configurations keyed by code.
    pub async fn state_taxes(&self) -> Result<BTreeMap<String, StateTaxConfig>, CarKeepError> {
        Ok(self.registry().await?.list())
    }

    /// Validates, normalizes and stores `config`, replacing any existing
    /// configuration with the same code.
    pub async fn upsert_state_tax(
        &self,
        config: StateTaxConfig,
    ) -> Result<StateTaxConfig, CarKeepError> {
        config.validate()?;
        let config = config.normalized();
        self.repo.upsert_state_tax(&config).await?;
        info!(state = %config.state_code, "state tax configuration saved");
        Ok(config)
    }

    /// Deletes a configuration.
    ///
    /// # Errors
    ///
    /// [`CarKeepError::ProtectedRecord`] for VA, TX and CA, before storage is
    /// touched; [`CarKeepError::NotFound`] for unknown codes.
    pub async fn delete_state_tax(
        &self,
        code: &str,
    ) -> Result<(), CarKeepError> {
        validate_state_code("state_code", code)?;
        let code = normalize_state_code(code);
        if is_protected(&code) {
            return Err(CarKeepError::ProtectedRecord(code));
        }
        self.repo
            .delete_state_tax(&code)
            .await
            .map_err(|e| CarKeepError::from_repository(e, RecordKind::StateTax, &code))?;
        info!(state = %code, "state tax configuration deleted");
        Ok(())
    }

    // =========================================================================
    // Scenarios
    // =========================================================================

    /// Every stored scenario, ordered by key.
    pub async fn scenarios(&self) -> Result<Vec<Scenario>, CarKeepError> {
        let mut scenarios = self.repo.list_scenarios().await?;
        scenarios.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(scenarios)
    }

    pub async fn scenario(
        &self,
        key: &str,
    ) -> Result<Scenario, CarKeepError> {
        self.repo
            .get_scenario(key)
            .await
            .map_err(|e| CarKeepError::from_repository(e, RecordKind::Scenario, key))
    }

    /// Stores a new scenario.
    ///
    /// # Errors
    ///
    /// [`CarKeepError::AlreadyExists`] when the key is taken;
    /// [`CarKeepError::NotFound`] when its state code is not configured.
    pub async fn create_scenario(
        &self,
        scenario: Scenario,
    ) -> Result<Scenario, CarKeepError> {
        let scenario = self.checked_scenario(scenario).await?;
        self.repo
            .create_scenario(&scenario)
            .await
            .map_err(|e| CarKeepError::from_repository(e, RecordKind::Scenario, &scenario.key))?;
        info!(scenario = %scenario.key, "scenario created");
        Ok(scenario)
    }

    /// Replaces the scenario stored under `key` with `scenario`.
    pub async fn update_scenario(
        &self,
        key: &str,
        scenario: Scenario,
    ) -> Result<Scenario, CarKeepError> {
        if scenario.key != key {
            return Err(CarKeepError::validation(
                "scenario.key",
                format!("'{}' does not match '{key}'", scenario.key),
            ));
        }
        let scenario = self.checked_scenario(scenario).await?;
        self.repo
            .update_scenario(&scenario)
            .await
            .map_err(|e| CarKeepError::from_repository(e, RecordKind::Scenario, key))?;
        info!(scenario = %key, "scenario updated");
        Ok(scenario)
    }

    pub async fn delete_scenario(
        &self,
        key: &str,
    ) -> Result<(), CarKeepError> {
        self.repo
            .delete_scenario(key)
            .await
            .map_err(|e| CarKeepError::from_repository(e, RecordKind::Scenario, key))?;
        info!(scenario = %key, "scenario deleted");
        Ok(())
    }

    /// Copies a scenario under the first free key of `{key}_copy`,
    /// `{key}_copy1`, `{key}_copy2`, ...
    pub async fn duplicate_scenario(
        &self,
        key: &str,
    ) -> Result<Scenario, CarKeepError> {
        let source = self.scenario(key).await?;
        let taken: Vec<String> = self
            .repo
            .list_scenarios()
            .await?
            .into_iter()
            .map(|s| s.key)
            .collect();

        let mut copy_key = format!("{key}_copy");
        let mut counter = 1;
        while taken.contains(&copy_key) {
            copy_key = format!("{key}_copy{counter}");
            counter += 1;
        }

        let copy = Scenario {
            key: copy_key,
            description: format!("{} (Copy)", source.description),
            ..source
        };
        self.create_scenario(copy).await
    }

    async fn checked_scenario(
        &self,
        scenario: Scenario,
    ) -> Result<Scenario, CarKeepError> {
        scenario.validate()?;
        let state_code = normalize_state_code(&scenario.state_code);
        self.registry().await?.get(&state_code)?;
        Ok(Scenario { state_code, ..scenario })
    }

    // =========================================================================
    // Baseline
    // =========================================================================

    pub async fn baseline(&self) -> Result<Baseline, CarKeepError> {
        self.repo
            .get_baseline()
            .await?
            .ok_or_else(|| CarKeepError::not_found(RecordKind::Baseline, BASELINE_KEY))
    }

    /// Replaces the stored baseline.
    pub async fn replace_baseline(
        &self,
        baseline: Baseline,
    ) -> Result<Baseline, CarKeepError> {
        baseline.validate()?;
        let state_code = normalize_state_code(&baseline.state_code);
        self.registry().await?.get(&state_code)?;
        let baseline = Baseline { state_code, ..baseline };
        self.repo.put_baseline(&baseline).await?;
        info!(vehicle = %baseline.vehicle.name, "baseline replaced");
        Ok(baseline)
    }

    /// Pays down the baseline loan over the comparison horizon.
    pub async fn baseline_payoff(&self) -> Result<LoanPayoff, CarKeepError> {
        LoanPayoff::for_current_loan(&self.baseline().await?.current_loan)
    }

    // =========================================================================
    // Comparisons
    // =========================================================================

    /// Compares the stored scenario `key` against the stored baseline.
    pub async fn compare(
        &self,
        key: &str,
    ) -> Result<ScenarioComparison, CarKeepError> {
        let registry = self.registry().await?;
        let scenario = self.scenario(key).await?;
        let baseline = self.repo.get_baseline().await?;
        ScenarioComparator::new(&registry).compare(&scenario, baseline.as_ref())
    }

    /// Compares every stored scenario, ordered by key.
    pub async fn compare_all(&self) -> Result<Vec<ScenarioComparison>, CarKeepError> {
        let registry = self.registry().await?;
        let scenarios = self.scenarios().await?;
        let baseline = self.repo.get_baseline().await?;
        ScenarioComparator::new(&registry).compare_all(&scenarios, baseline.as_ref())
    }

    /// Headline figures across every stored scenario.
    pub async fn analysis(&self) -> Result<CostAnalysis, CarKeepError> {
        let registry = self.registry().await?;
        let scenarios = self.scenarios().await?;
        let baseline = self.repo.get_baseline().await?;

        let comparator = ScenarioComparator::new(&registry);
        let baseline_cost = comparator.baseline_cost(baseline.as_ref())?;
        let comparisons = comparator.compare_all(&scenarios, baseline.as_ref())?;
        CostAnalysis::from_comparisons(&baseline_cost, &comparisons)
    }

    pub async fn matrix(&self) -> Result<ComparisonMatrix, CarKeepError> {
        Ok(ComparisonMatrix::from_comparisons(&self.compare_all().await?))
    }
}
