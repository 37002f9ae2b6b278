//! Import of scenario documents in the legacy `{baseline, examples}` shape:
//!
//! ```json
//! {
//!   "baseline": {
//!     "description": "...", "state": "VA",
//!     "vehicle": {"name": "Acura RDX", "values_3yr": [21000, 18900, 17000, 15300]},
//!     "current_loan": {"monthly_payment": 564.10, "principal_balance": 9909.95,
//!                      "interest_rate": 0.0439, "extra_payment": 85.90}
//!   },
//!   "examples": {
//!     "lucid_lease": {
//!       "description": "...", "state": "VA",
//!       "scenario": {"type": "lease", "vehicle": {...},
//!                    "financing": {"monthly_payment": 368, "lease_terms": 36}},
//!       "trade_in": {"trade_in_value": 21000, "loan_balance": 9909.95},
//!       "cost_overrides": {"insurance_monthly": {"Lucid Air": 176}}
//!     }
//!   }
//! }
//! ```
//!
//! An example without `state` inherits the baseline's. A four-value
//! `values_3yr` lists today's value first; that entry is dropped.
//!
//! `cost_overrides` maps each running cost to either a flat amount or a
//! table keyed by vehicle name; only the entry for the record's own vehicle
//! applies. Lease incentives are ignored.

use std::collections::BTreeMap;
use std::io::Read;

use carkeep_core::{
    Baseline, CarKeepError, CarKeepRepository, CarKeepService, CurrentLoan, Financing, HORIZON_YEARS,
    LeaseTerms, LoanTerms, OperatingCosts, RecordKind, RepositoryError, Scenario, TradeIn, Vehicle,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_STATE: &str = "VA";

#[derive(Debug, Error)]
pub enum ScenarioFileError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid scenario '{key}': {source}")]
    InvalidScenario {
        key: String,
        #[source]
        source: CarKeepError,
    },

    #[error("Invalid baseline: {0}")]
    InvalidBaseline(#[source] CarKeepError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScenarioFile {
    #[serde(default)]
    pub baseline: Option<FileBaseline>,
    #[serde(default)]
    pub examples: BTreeMap<String, FileExample>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileBaseline {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub state: Option<String>,
    pub vehicle: FileVehicle,
    pub current_loan: CurrentLoan,
    #[serde(default)]
    pub cost_overrides: FileCostOverrides,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileVehicle {
    pub name: String,
    #[serde(default)]
    pub msrp: Decimal,
    #[serde(default)]
    pub current_value: Decimal,
    pub values_3yr: Vec<Decimal>,
    #[serde(default)]
    pub impairment: Decimal,
    #[serde(default)]
    pub impairment_affects_taxes: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileExample {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    pub scenario: FileScenario,
    #[serde(default)]
    pub trade_in: Option<TradeIn>,
    #[serde(default)]
    pub cost_overrides: FileCostOverrides,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FileCostOverrides {
    #[serde(default)]
    pub insurance_monthly: Option<FileCostOverride>,
    #[serde(default)]
    pub maintenance_monthly: Option<FileCostOverride>,
    #[serde(default)]
    pub fuel_monthly: Option<FileCostOverride>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileCostOverride {
    Flat(Decimal),
    PerVehicle(BTreeMap<String, Decimal>),
}

impl FileCostOverride {
    fn for_vehicle(&self, vehicle: &str) -> Option<Decimal> {
        match self {
            Self::Flat(amount) => Some(*amount),
            Self::PerVehicle(by_name) => by_name.get(vehicle).copied(),
        }
    }
}

impl FileCostOverrides {
    /// Running costs for `vehicle`, or `None` when nothing applies to it.
    fn resolve(&self, vehicle: &str) -> Option<OperatingCosts> {
        let pick = |o: &Option<FileCostOverride>| o.as_ref().and_then(|o| o.for_vehicle(vehicle));
        let insurance = pick(&self.insurance_monthly);
        let maintenance = pick(&self.maintenance_monthly);
        let fuel = pick(&self.fuel_monthly);
        if insurance.is_none() && maintenance.is_none() && fuel.is_none() {
            return None;
        }
        let defaults = OperatingCosts::default();
        Some(OperatingCosts {
            insurance_monthly: insurance.unwrap_or(defaults.insurance_monthly),
            maintenance_monthly: maintenance.unwrap_or(defaults.maintenance_monthly),
            fuel_monthly: fuel.unwrap_or(defaults.fuel_monthly),
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileFinancingType {
    Loan,
    Lease,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileScenario {
    #[serde(rename = "type")]
    pub kind: FileFinancingType,
    pub vehicle: FileVehicle,
    pub financing: FileFinancing,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FileFinancing {
    pub monthly_payment: Decimal,
    #[serde(default)]
    pub lease_terms: Option<u32>,
    #[serde(default)]
    pub loan_term: Option<u32>,
    #[serde(default)]
    pub principal_balance: Decimal,
}

impl FileVehicle {
    fn to_vehicle(&self) -> Vehicle {
        let values_3yr = if self.values_3yr.len() == HORIZON_YEARS + 1 {
            self.values_3yr[1..].to_vec()
        } else {
            self.values_3yr.clone()
        };
        Vehicle {
            name: self.name.clone(),
            msrp: self.msrp,
            current_value: self.current_value,
            values_3yr,
            impairment: self.impairment,
            impairment_affects_taxes: self.impairment_affects_taxes,
        }
    }
}

impl FileScenario {
    fn to_financing(&self) -> Result<Financing, CarKeepError> {
        let f = &self.financing;
        match self.kind {
            FileFinancingType::Loan => Ok(Financing::Loan(LoanTerms {
                monthly_payment: f.monthly_payment,
                loan_term: f.loan_term.ok_or_else(|| {
                    CarKeepError::validation("scenario.financing.loan_term", "is required for a loan")
                })?,
                principal_balance: f.principal_balance,
            })),
            FileFinancingType::Lease => Ok(Financing::Lease(LeaseTerms {
                monthly_payment: f.monthly_payment,
                lease_terms: f.lease_terms.ok_or_else(|| {
                    CarKeepError::validation("scenario.financing.lease_terms", "is required for a lease")
                })?,
            })),
        }
    }
}

impl ScenarioFile {
    /// The document's baseline, if it has one.
    pub fn baseline_record(&self) -> Option<Baseline> {
        self.baseline.as_ref().map(|b| Baseline {
            description: b.description.clone(),
            state_code: b.state.clone().unwrap_or_else(|| DEFAULT_STATE.to_string()),
            vehicle: b.vehicle.to_vehicle(),
            current_loan: b.current_loan.clone(),
            operating_costs: b.cost_overrides.resolve(&b.vehicle.name),
        })
    }

    /// Every example as a [`Scenario`], in key order.
    pub fn scenario_records(&self) -> Result<Vec<Scenario>, ScenarioFileError> {
        let default_state = self
            .baseline
            .as_ref()
            .and_then(|b| b.state.clone())
            .unwrap_or_else(|| DEFAULT_STATE.to_string());

        self.examples
            .iter()
            .map(|(key, example)| {
                let financing = example.scenario.to_financing().map_err(|source| {
                    ScenarioFileError::InvalidScenario {
                        key: key.clone(),
                        source,
                    }
                })?;
                Ok(Scenario {
                    key: key.clone(),
                    description: example.description.clone().unwrap_or_else(|| key.clone()),
                    state_code: example.state.clone().unwrap_or_else(|| default_state.clone()),
                    vehicle: example.scenario.vehicle.to_vehicle(),
                    financing,
                    trade_in: example.trade_in.clone(),
                    operating_costs: example.cost_overrides.resolve(&example.scenario.vehicle.name),
                })
            })
            .collect()
    }
}

/// What a load changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioLoadSummary {
    pub baseline_replaced: bool,
    pub created: usize,
    pub updated: usize,
}

pub struct ScenarioFileLoader;

impl ScenarioFileLoader {
    /// Parse a scenario document from a JSON reader.
    pub fn parse<R: Read>(reader: R) -> Result<ScenarioFile, ScenarioFileError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Stores the document: the baseline (if present) is replaced first, then
    /// every example is created, or updated when its key already exists.
    /// Every record is validated before the first write.
    pub async fn load(
        repo: &dyn CarKeepRepository,
        file: &ScenarioFile,
    ) -> Result<ScenarioLoadSummary, ScenarioFileError> {
        let baseline = file.baseline_record();
        let scenarios = file.scenario_records()?;

        if let Some(baseline) = &baseline {
            baseline.validate().map_err(ScenarioFileError::InvalidBaseline)?;
        }
        for scenario in &scenarios {
            scenario.validate().map_err(|source| ScenarioFileError::InvalidScenario {
                key: scenario.key.clone(),
                source,
            })?;
        }

        let service = CarKeepService::new(repo);
        let mut summary = ScenarioLoadSummary::default();

        if let Some(baseline) = baseline {
            service.replace_baseline(baseline).await.map_err(|e| match e {
                CarKeepError::Storage(inner) => ScenarioFileError::Repository(inner),
                other => ScenarioFileError::InvalidBaseline(other),
            })?;
            summary.baseline_replaced = true;
        }

        for scenario in scenarios {
            let key = scenario.key.clone();
            let invalid = |source: CarKeepError| match source {
                CarKeepError::Storage(inner) => ScenarioFileError::Repository(inner),
                other => ScenarioFileError::InvalidScenario {
                    key: key.clone(),
                    source: other,
                },
            };

            match service.create_scenario(scenario.clone()).await {
                Ok(_) => summary.created += 1,
                Err(CarKeepError::AlreadyExists {
                    kind: RecordKind::Scenario,
                    ..
                }) => {
                    service.update_scenario(&key, scenario).await.map_err(invalid)?;
                    summary.updated += 1;
                }
                Err(e) => return Err(invalid(e)),
            }
            debug!(scenario = %key, "scenario loaded");
        }

        info!(
            created = summary.created,
            updated = summary.updated,
            baseline = summary.baseline_replaced,
            "scenario file loaded"
        );
        Ok(summary)
    }
}
