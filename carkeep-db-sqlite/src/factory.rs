use std::path::PathBuf;

use async_trait::async_trait;
use carkeep_core::db::{CarKeepRepository, DbConfig, RepositoryError, RepositoryFactory};
use tracing::info;

use crate::repository::SqliteRepository;

/// Environment variable that overrides the seeds directory.
pub const SEEDS_DIR_ENV: &str = "CARKEEP_DB_SQLITE_SEEDS_DIR";

/// Resolve the seeds directory at runtime so it works in both development and
/// packaged distribution.
///
/// Resolution order:
/// 1. **`CARKEEP_DB_SQLITE_SEEDS_DIR`** if set.
/// 2. **`./seeds`** if the directory exists in the current working directory.
/// 3. **Crate manifest dir**, `$CARGO_MANIFEST_DIR/seeds`, as last resort.
pub fn seeds_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(SEEDS_DIR_ENV) {
        return PathBuf::from(dir);
    }
    let cwd_seeds = PathBuf::from("./seeds");
    if cwd_seeds.is_dir() {
        return cwd_seeds;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("seeds")
}

/// Maps a connection string onto a sqlx URL. `:memory:` becomes a private
/// in-memory database, a bare path becomes `sqlite:{path}?mode=rwc` so the
/// file is created on first use, and `sqlite:` URLs pass through.
pub fn sqlite_url(connection_string: &str) -> String {
    let trimmed = connection_string.trim();
    if trimmed == ":memory:" {
        "sqlite::memory:".to_string()
    } else if trimmed.starts_with("sqlite:") {
        trimmed.to_string()
    } else {
        format!("sqlite:{trimmed}?mode=rwc")
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`carkeep_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use carkeep_core::db::RepositoryRegistry;
/// use carkeep_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` (see
    /// [`sqlite_url`]), then run migrations and seeds. Seeds only insert
    /// rows that are missing, so reopening a store keeps edits.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn CarKeepRepository>, RepositoryError> {
        let repo = if config.is_in_memory() {
            SqliteRepository::new_in_memory().await
        } else {
            SqliteRepository::new(&sqlite_url(&config.connection_string)).await
        }
        .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;

        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;
        repo.run_seeds(&seeds_dir())
            .await
            .map_err(|e| RepositoryError::Database(format!("{e:#}")))?;

        info!(connection = %config.connection_string, "sqlite repository ready");
        Ok(Box::new(repo))
    }
}
