use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use carkeep_core::{
    Baseline, CarKeepRepository, ReliefCapBasis, RepositoryError, Scenario, StateTaxConfig,
};
use chrono::Utc;
use sqlx::{Row, sqlite::SqlitePool, sqlite::SqlitePoolOptions};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    /// A private in-memory database on a single connection.
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to create in-memory database")?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "applied seed file");
        }

        info!(dir = %seeds_dir.display(), "seeds applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn database_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn row_to_state_tax(row: &sqlx::sqlite::SqliteRow) -> Result<StateTaxConfig, RepositoryError> {
    let basis: String = row.try_get("relief_cap_basis").map_err(database_error)?;
    let relief_cap_basis = ReliefCapBasis::parse(&basis)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid relief cap basis: {}", basis)))?;

    Ok(StateTaxConfig {
        state_code: row.try_get("state_code").map_err(database_error)?,
        state_name: row.try_get("state_name").map_err(database_error)?,
        property_tax_rate: get_decimal(row, "property_tax_rate")?,
        pptra_relief: get_decimal(row, "pptra_relief")?,
        relief_cap: get_decimal(row, "relief_cap")?,
        relief_cap_basis,
    })
}

fn row_to_scenario(row: &sqlx::sqlite::SqliteRow) -> Result<Scenario, RepositoryError> {
    let key: String = row.try_get("key").map_err(database_error)?;
    let payload: String = row.try_get("payload").map_err(database_error)?;
    let scenario: Scenario = serde_json::from_str(&payload)
        .map_err(|e| RepositoryError::Database(format!("Corrupt scenario '{}': {}", key, e)))?;
    if scenario.key != key {
        return Err(RepositoryError::Database(format!(
            "Scenario stored under '{}' carries key '{}'",
            key, scenario.key
        )));
    }
    Ok(scenario)
}

fn scenario_payload(scenario: &Scenario) -> Result<String, RepositoryError> {
    serde_json::to_string(scenario).map_err(database_error)
}

#[async_trait]
impl CarKeepRepository for SqliteRepository {
    async fn get_state_tax(
        &self,
        code: &str,
    ) -> Result<StateTaxConfig, RepositoryError> {
        let row = sqlx::query(
            "SELECT state_code, state_name, property_tax_rate, pptra_relief,
                    relief_cap, relief_cap_basis
             FROM state_tax_config WHERE state_code = ?",
        )
        .bind(code.to_ascii_uppercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?
        .ok_or(RepositoryError::NotFound)?;

        row_to_state_tax(&row)
    }

    async fn list_state_taxes(&self) -> Result<Vec<StateTaxConfig>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT state_code, state_name, property_tax_rate, pptra_relief,
                    relief_cap, relief_cap_basis
             FROM state_tax_config ORDER BY state_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(row_to_state_tax).collect()
    }

    async fn upsert_state_tax(
        &self,
        config: &StateTaxConfig,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO state_tax_config (
                state_code, state_name, property_tax_rate, pptra_relief,
                relief_cap, relief_cap_basis, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(state_code) DO UPDATE SET
                state_name = excluded.state_name,
                property_tax_rate = excluded.property_tax_rate,
                pptra_relief = excluded.pptra_relief,
                relief_cap = excluded.relief_cap,
                relief_cap_basis = excluded.relief_cap_basis,
                updated_at = excluded.updated_at",
        )
        .bind(config.state_code.to_ascii_uppercase())
        .bind(&config.state_name)
        .bind(decimal_to_text(config.property_tax_rate))
        .bind(decimal_to_text(config.pptra_relief))
        .bind(decimal_to_text(config.relief_cap))
        .bind(config.relief_cap_basis.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn delete_state_tax(
        &self,
        code: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM state_tax_config WHERE state_code = ?")
            .bind(code.to_ascii_uppercase())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_scenarios(&self) -> Result<Vec<Scenario>, RepositoryError> {
        let rows = sqlx::query("SELECT key, payload FROM scenario ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.iter().map(row_to_scenario).collect()
    }

    async fn get_scenario(
        &self,
        key: &str,
    ) -> Result<Scenario, RepositoryError> {
        let row = sqlx::query("SELECT key, payload FROM scenario WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_scenario(&row)
    }

    async fn create_scenario(
        &self,
        scenario: &Scenario,
    ) -> Result<(), RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO scenario (key, payload, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(&scenario.key)
        .bind(scenario_payload(scenario)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::AlreadyExists);
        }

        Ok(())
    }

    async fn update_scenario(
        &self,
        scenario: &Scenario,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE scenario SET payload = ?, updated_at = ? WHERE key = ?")
            .bind(scenario_payload(scenario)?)
            .bind(Utc::now())
            .bind(&scenario.key)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_scenario(
        &self,
        key: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM scenario WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn get_baseline(&self) -> Result<Option<Baseline>, RepositoryError> {
        let row = sqlx::query("SELECT payload FROM baseline WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(database_error)?;
        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| RepositoryError::Database(format!("Corrupt baseline: {}", e)))
    }

    async fn put_baseline(
        &self,
        baseline: &Baseline,
    ) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(baseline).map_err(database_error)?;
        sqlx::query(
            "INSERT INTO baseline (id, payload, updated_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at",
        )
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use carkeep_core::{CurrentLoan, Financing, LeaseTerms, TradeIn, Vehicle};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let repo = SqliteRepository::new_in_memory()
            .await
            .expect("Failed to create in-memory database");
        repo.run_migrations()
            .await
            .expect("Failed to run migrations");
        repo
    }

    async fn setup_seeded_db() -> SqliteRepository {
        let repo = setup_test_db().await;
        repo.run_seeds(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds"))
            .await
            .expect("Failed to run seeds");
        repo
    }

    fn oregon() -> StateTaxConfig {
        StateTaxConfig {
            state_code: "OR".to_string(),
            state_name: "Oregon".to_string(),
            property_tax_rate: dec!(0.0125),
            pptra_relief: dec!(0.25),
            relief_cap: dec!(1500.50),
            relief_cap_basis: ReliefCapBasis::ReliefAmount,
        }
    }

    fn lucid_lease() -> Scenario {
        Scenario {
            key: "lucid_lease".to_string(),
            description: "Lease a Lucid Air".to_string(),
            state_code: "VA".to_string(),
            vehicle: Vehicle {
                name: "Lucid Air".to_string(),
                msrp: dec!(72800),
                current_value: dec!(0),
                values_3yr: vec![dec!(55100), dec!(41500), dec!(31059)],
                impairment: dec!(0),
                impairment_affects_taxes: false,
            },
            financing: Financing::Lease(LeaseTerms {
                monthly_payment: dec!(368),
                lease_terms: 36,
            }),
            trade_in: Some(TradeIn {
                trade_in_value: dec!(21000),
                loan_balance: dec!(9909.95),
                incentives: dec!(26500),
            }),
            operating_costs: None,
        }
    }

    // state tax configuration

    #[tokio::test]
    async fn test_seeded_state_taxes() {
        let repo = setup_seeded_db().await;

        let codes: Vec<String> = repo
            .list_state_taxes()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.state_code)
            .collect();

        assert_eq!(codes, vec!["CA", "TX", "VA"]);

        let va = repo.get_state_tax("va").await.unwrap();
        assert_eq!(va.property_tax_rate, dec!(0.0457));
        assert_eq!(va.pptra_relief, dec!(0.51));
        assert_eq!(va.relief_cap, dec!(20000));
        assert_eq!(va.relief_cap_basis, ReliefCapBasis::TaxableValue);
    }

    #[tokio::test]
    async fn test_seeds_are_idempotent() {
        let repo = setup_seeded_db().await;
        repo.upsert_state_tax(&StateTaxConfig {
            property_tax_rate: dec!(0.05),
            ..repo.get_state_tax("VA").await.unwrap()
        })
        .await
        .unwrap();

        repo.run_seeds(&PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds"))
            .await
            .expect("Failed to re-run seeds");

        assert_eq!(repo.list_state_taxes().await.unwrap().len(), 3);
        assert_eq!(
            repo.get_state_tax("VA").await.unwrap().property_tax_rate,
            dec!(0.05)
        );
    }

    #[tokio::test]
    async fn test_upsert_state_tax_round_trips_exactly() {
        let repo = setup_test_db().await;

        repo.upsert_state_tax(&oregon()).await.unwrap();

        assert_eq!(repo.get_state_tax("OR").await.unwrap(), oregon());
    }

    #[tokio::test]
    async fn test_upsert_state_tax_replaces_existing() {
        let repo = setup_test_db().await;
        repo.upsert_state_tax(&oregon()).await.unwrap();

        let mut changed = oregon();
        changed.state_name = "Oregon (revised)".to_string();
        changed.relief_cap_basis = ReliefCapBasis::TaxableValue;
        repo.upsert_state_tax(&changed).await.unwrap();

        assert_eq!(repo.list_state_taxes().await.unwrap(), vec![changed]);
    }

    #[tokio::test]
    async fn test_get_state_tax_not_found() {
        let repo = setup_test_db().await;

        assert_eq!(
            repo.get_state_tax("ZZ").await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_delete_state_tax() {
        let repo = setup_test_db().await;
        repo.upsert_state_tax(&oregon()).await.unwrap();

        repo.delete_state_tax("or").await.unwrap();

        assert_eq!(
            repo.delete_state_tax("OR").await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_state_tax_stored_as_text() {
        let repo = setup_test_db().await;
        repo.upsert_state_tax(&oregon()).await.unwrap();

        let row = sqlx::query(
            "SELECT typeof(relief_cap) AS kind, relief_cap FROM state_tax_config WHERE state_code = 'OR'",
        )
        .fetch_one(repo.pool())
        .await
        .unwrap();

        assert_eq!(row.get::<String, _>("kind"), "text");
        assert_eq!(row.get::<String, _>("relief_cap"), "1500.5");
    }

    // scenarios

    #[tokio::test]
    async fn test_create_and_get_scenario() {
        let repo = setup_test_db().await;

        repo.create_scenario(&lucid_lease()).await.unwrap();

        assert_eq!(repo.get_scenario("lucid_lease").await.unwrap(), lucid_lease());
    }

    #[tokio::test]
    async fn test_create_duplicate_scenario() {
        let repo = setup_test_db().await;
        repo.create_scenario(&lucid_lease()).await.unwrap();

        assert_eq!(
            repo.create_scenario(&lucid_lease()).await,
            Err(RepositoryError::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_update_scenario() {
        let repo = setup_test_db().await;
        repo.create_scenario(&lucid_lease()).await.unwrap();

        let mut changed = lucid_lease();
        changed.trade_in = None;
        repo.update_scenario(&changed).await.unwrap();

        assert_eq!(repo.get_scenario("lucid_lease").await.unwrap().trade_in, None);
    }

    #[tokio::test]
    async fn test_update_missing_scenario() {
        let repo = setup_test_db().await;

        assert_eq!(
            repo.update_scenario(&lucid_lease()).await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_list_and_delete_scenarios() {
        let repo = setup_test_db().await;
        let mut other = lucid_lease();
        other.key = "a_first".to_string();
        repo.create_scenario(&lucid_lease()).await.unwrap();
        repo.create_scenario(&other).await.unwrap();

        let keys: Vec<String> = repo
            .list_scenarios()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert_eq!(keys, vec!["a_first", "lucid_lease"]);

        repo.delete_scenario("a_first").await.unwrap();
        assert_eq!(repo.list_scenarios().await.unwrap().len(), 1);
        assert_eq!(
            repo.delete_scenario("a_first").await,
            Err(RepositoryError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_corrupt_scenario_payload() {
        let repo = setup_test_db().await;
        sqlx::query("INSERT INTO scenario (key, payload) VALUES ('broken', '{not json')")
            .execute(repo.pool())
            .await
            .unwrap();

        assert!(matches!(
            repo.get_scenario("broken").await,
            Err(RepositoryError::Database(msg)) if msg.contains("broken")
        ));
    }

    // baseline

    #[tokio::test]
    async fn test_baseline_absent_before_seeding() {
        let repo = setup_test_db().await;

        assert_eq!(repo.get_baseline().await, Ok(None));
    }

    #[tokio::test]
    async fn test_seeded_baseline() {
        let repo = setup_seeded_db().await;

        let baseline = repo.get_baseline().await.unwrap().expect("baseline seeded");

        assert_eq!(baseline.state_code, "VA");
        assert_eq!(baseline.vehicle.values_3yr, vec![dec!(18900), dec!(17000), dec!(15300)]);
        assert_eq!(
            baseline.current_loan,
            CurrentLoan {
                monthly_payment: dec!(564.10),
                principal_balance: dec!(9909.95),
                interest_rate: dec!(0.0439),
                extra_payment: dec!(85.90),
            }
        );
    }

    #[tokio::test]
    async fn test_put_baseline_replaces_single_row() {
        let repo = setup_seeded_db().await;
        let mut baseline = repo.get_baseline().await.unwrap().unwrap();
        baseline.description = "Replaced".to_string();

        repo.put_baseline(&baseline).await.unwrap();

        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM baseline")
            .fetch_one(repo.pool())
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 1);
        assert_eq!(repo.get_baseline().await.unwrap(), Some(baseline));
    }
}
