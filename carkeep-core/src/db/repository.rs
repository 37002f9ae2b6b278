use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Baseline, Scenario, StateTaxConfig};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Record already exists")]
    AlreadyExists,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Durable storage for state tax configurations, scenarios and the single
/// baseline. State codes are stored upper-cased; scenario keys verbatim.
#[async_trait]
pub trait CarKeepRepository: Send + Sync {
    // State tax configuration
    async fn get_state_tax(&self, code: &str) -> Result<StateTaxConfig, RepositoryError>;
    async fn list_state_taxes(&self) -> Result<Vec<StateTaxConfig>, RepositoryError>;
    async fn upsert_state_tax(&self, config: &StateTaxConfig) -> Result<(), RepositoryError>;
    async fn delete_state_tax(&self, code: &str) -> Result<(), RepositoryError>;

    // Scenarios
    async fn list_scenarios(&self) -> Result<Vec<Scenario>, RepositoryError>;
    async fn get_scenario(&self, key: &str) -> Result<Scenario, RepositoryError>;

    /// Fails with [`RepositoryError::AlreadyExists`] when the key is taken.
    async fn create_scenario(&self, scenario: &Scenario) -> Result<(), RepositoryError>;

    /// Fails with [`RepositoryError::NotFound`] when the key is unknown.
    async fn update_scenario(&self, scenario: &Scenario) -> Result<(), RepositoryError>;

    async fn delete_scenario(&self, key: &str) -> Result<(), RepositoryError>;

    // Baseline
    /// `None` when no baseline has been stored yet.
    async fn get_baseline(&self) -> Result<Option<Baseline>, RepositoryError>;
    async fn put_baseline(&self, baseline: &Baseline) -> Result<(), RepositoryError>;
}
