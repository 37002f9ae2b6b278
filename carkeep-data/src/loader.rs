use std::io::Read;

use carkeep_core::{CarKeepError, CarKeepRepository, CarKeepService, ReliefCapBasis, RepositoryError, StateTaxConfig};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading state tax configurations.
#[derive(Debug, Error)]
pub enum StateTaxLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid relief cap basis '{0}' (expected relief_amount or taxable_value)")]
    InvalidReliefCapBasis(String),

    #[error("Invalid configuration for '{state_code}': {source}")]
    InvalidRecord {
        state_code: String,
        #[source]
        source: CarKeepError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for StateTaxLoaderError {
    fn from(err: csv::Error) -> Self {
        StateTaxLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the state tax CSV file.
///
/// - `state_code`: two-letter code, any case
/// - `state_name`: display name
/// - `property_tax_rate`: annual rate as a fraction (e.g., 0.0457)
/// - `pptra_relief`: relief fraction (e.g., 0.51)
/// - `relief_cap`: relief cap in dollars
/// - `relief_cap_basis`: `relief_amount` or `taxable_value`; empty or absent
///   means `relief_amount`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StateTaxRecord {
    pub state_code: String,
    pub state_name: String,
    pub property_tax_rate: Decimal,
    pub pptra_relief: Decimal,
    pub relief_cap: Decimal,
    #[serde(default)]
    pub relief_cap_basis: Option<String>,
}

impl StateTaxRecord {
    pub fn to_config(&self) -> Result<StateTaxConfig, StateTaxLoaderError> {
        let basis = self.relief_cap_basis.as_deref().unwrap_or_default();
        let relief_cap_basis = ReliefCapBasis::parse(basis)
            .ok_or_else(|| StateTaxLoaderError::InvalidReliefCapBasis(basis.to_string()))?;
        Ok(StateTaxConfig {
            state_code: self.state_code.trim().to_string(),
            state_name: self.state_name.trim().to_string(),
            property_tax_rate: self.property_tax_rate,
            pptra_relief: self.pptra_relief,
            relief_cap: self.relief_cap,
            relief_cap_basis,
        })
    }
}

/// Loader for state tax configurations from CSV files.
///
/// Records go through [`CarKeepService::upsert_state_tax`], so they are
/// validated exactly like interactive edits and loading the same file twice
/// leaves the store unchanged.
pub struct StateTaxLoader;

impl StateTaxLoader {
    /// Parse state tax records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<StateTaxRecord>, StateTaxLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: StateTaxRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Upsert every record. All records are converted and validated before
    /// the first write, so a bad row leaves the store untouched.
    pub async fn load(
        repo: &dyn CarKeepRepository,
        records: &[StateTaxRecord],
    ) -> Result<usize, StateTaxLoaderError> {
        let configs = records
            .iter()
            .map(|record| {
                let config = record.to_config()?;
                config.validate().map_err(|source| StateTaxLoaderError::InvalidRecord {
                    state_code: config.state_code.clone(),
                    source,
                })?;
                Ok(config)
            })
            .collect::<Result<Vec<_>, StateTaxLoaderError>>()?;

        let service = CarKeepService::new(repo);
        for config in configs {
            let state_code = config.state_code.clone();
            service.upsert_state_tax(config).await.map_err(|e| match e {
                CarKeepError::Storage(inner) => StateTaxLoaderError::Repository(inner),
                other => StateTaxLoaderError::InvalidRecord {
                    state_code,
                    source: other,
                },
            })?;
        }

        info!(count = records.len(), "state tax configurations loaded");
        Ok(records.len())
    }
}
