use std::collections::BTreeMap;

use async_trait::async_trait;

use super::repository::{CarKeepRepository, RepositoryError};

/// Which storage backend to open and how to reach it.
///
/// `connection_string` is handed to the backend untouched. For SQLite it is a
/// file path (`carkeep.db`) or `:memory:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl DbConfig {
    /// Backend names are matched case-insensitively.
    pub fn new(backend: impl Into<String>, connection_string: impl Into<String>) -> Self {
        Self {
            backend: backend.into().to_ascii_lowercase(),
            connection_string: connection_string.into(),
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.connection_string.contains(":memory:")
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new("sqlite", ":memory:")
    }
}

/// Opens a [`CarKeepRepository`] for one backend. Storage crates export one
/// of these and the binary registers it at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Opens the store and leaves it ready for use, schema and seed data
    /// included.
    async fn create(&self, config: &DbConfig) -> Result<Box<dyn CarKeepRepository>, RepositoryError>;
}

/// Backend factories keyed by [`RepositoryFactory::backend_name`].
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: BTreeMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later factory with the same name replaces the earlier one.
    pub fn register(&mut self, factory: Box<dyn RepositoryFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Opens the backend named by `config.backend`.
    ///
    /// # Errors
    /// [`RepositoryError::Configuration`] naming the registered backends when
    /// none matches; otherwise whatever the factory reports.
    pub async fn create(&self, config: &DbConfig) -> Result<Box<dyn CarKeepRepository>, RepositoryError> {
        match self.factories.get(config.backend.as_str()) {
            Some(factory) => factory.create(config).await,
            None => {
                let known: Vec<&str> = self.factories.keys().copied().collect();
                Err(RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {}",
                    config.backend,
                    known.join(", ")
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use crate::models::{Baseline, Scenario, StateTaxConfig};

    use super::*;

    /// A store with nothing in it. Writes are refused.
    struct EmptyStore;

    #[async_trait]
    impl CarKeepRepository for EmptyStore {
        async fn get_state_tax(&self, _code: &str) -> Result<StateTaxConfig, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_state_taxes(&self) -> Result<Vec<StateTaxConfig>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn upsert_state_tax(&self, _config: &StateTaxConfig) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("read-only".into()))
        }
        async fn delete_state_tax(&self, _code: &str) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn list_scenarios(&self) -> Result<Vec<Scenario>, RepositoryError> {
            Ok(Vec::new())
        }
        async fn get_scenario(&self, _key: &str) -> Result<Scenario, RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn create_scenario(&self, _scenario: &Scenario) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("read-only".into()))
        }
        async fn update_scenario(&self, _scenario: &Scenario) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn delete_scenario(&self, _key: &str) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }
        async fn get_baseline(&self) -> Result<Option<Baseline>, RepositoryError> {
            Ok(None)
        }
        async fn put_baseline(&self, _baseline: &Baseline) -> Result<(), RepositoryError> {
            Err(RepositoryError::Database("read-only".into()))
        }
    }

    /// Records every connection string it is asked to open.
    struct RecordingFactory {
        name: &'static str,
        opened: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RepositoryFactory for RecordingFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(&self, config: &DbConfig) -> Result<Box<dyn CarKeepRepository>, RepositoryError> {
            self.opened.lock().unwrap().push(config.connection_string.clone());
            Ok(Box::new(EmptyStore))
        }
    }

    struct UnreachableFactory;

    #[async_trait]
    impl RepositoryFactory for UnreachableFactory {
        fn backend_name(&self) -> &'static str {
            "remote"
        }
        async fn create(&self, config: &DbConfig) -> Result<Box<dyn CarKeepRepository>, RepositoryError> {
            Err(RepositoryError::Connection(format!("cannot reach {}", config.connection_string)))
        }
    }

    fn recording(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<Mutex<Vec<String>>>) {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let factory = RecordingFactory { name, opened: Arc::clone(&opened) };
        (Box::new(factory), opened)
    }

    #[test]
    fn config_detects_in_memory_databases() {
        assert!(DbConfig::default().is_in_memory());
        assert!(DbConfig::new("sqlite", "sqlite::memory:").is_in_memory());
        assert!(!DbConfig::new("sqlite", "garage/carkeep.db").is_in_memory());
        assert_eq!(DbConfig::new("SQLite", "carkeep.db").backend, "sqlite");
    }

    #[tokio::test]
    async fn routes_to_named_backend_with_connection_string() {
        let (sqlite, sqlite_opened) = recording("sqlite");
        let (other, other_opened) = recording("memo");
        let mut registry = RepositoryRegistry::new();
        registry.register(sqlite);
        registry.register(other);

        let repo = registry
            .create(&DbConfig::new("SQLITE", "garage.db"))
            .await
            .unwrap();

        assert_eq!(repo.get_baseline().await, Ok(None));
        assert_eq!(*sqlite_opened.lock().unwrap(), vec!["garage.db".to_string()]);
        assert!(other_opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn later_registration_wins() {
        let (first, first_opened) = recording("sqlite");
        let (second, second_opened) = recording("sqlite");
        let mut registry = RepositoryRegistry::new();
        registry.register(first);
        registry.register(second);

        assert!(registry.create(&DbConfig::default()).await.is_ok());
        assert!(first_opened.lock().unwrap().is_empty());
        assert_eq!(second_opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_backend_lists_registered_ones() {
        let mut registry = RepositoryRegistry::new();
        registry.register(recording("sqlite").0);
        registry.register(Box::new(UnreachableFactory));

        match registry.create(&DbConfig::new("postgres", "db")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert_eq!(msg, "unknown backend 'postgres'; available: remote, sqlite");
            }
            Err(other) => panic!("expected a configuration error, got {other}"),
            Ok(_) => panic!("expected a configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn factory_failure_is_passed_through() {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(UnreachableFactory));

        let result = registry.create(&DbConfig::new("remote", "db.example:5432")).await;
        assert!(matches!(
            result,
            Err(RepositoryError::Connection(ref msg)) if msg == "cannot reach db.example:5432"
        ));
    }
}
