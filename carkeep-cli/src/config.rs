//! TOML configuration for the `carkeep` binary.
//!
//! ```toml
//! [database]
//! backend = "sqlite"
//! connection_string = "carkeep.db"
//!
//! [logging]
//! level = "info"
//! file = "carkeep.log"
//! ```
//!
//! Every key is optional. The file is looked up in this order: the
//! `--config` flag, the `CARKEEP_CONFIG` environment variable, then
//! `./carkeep.toml`. With none of them present the defaults apply.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use carkeep_core::db::DbConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV: &str = "CARKEEP_CONFIG";
/// Configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "carkeep.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration in '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: String,
    /// For SQLite a file path (e.g. `carkeep.db`), a `sqlite:` URL or `:memory:`.
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "carkeep.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// A bare level or any `EnvFilter` directive. `RUST_LOG` wins when set.
    pub level: String,
    /// Log file to append to, in addition to stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Where a configuration file came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named by `--config` or `CARKEEP_CONFIG`; it must exist.
    Explicit(PathBuf),
    /// `./carkeep.toml`, found in the working directory.
    WorkingDir(PathBuf),
}

impl ConfigSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::WorkingDir(path) => path,
        }
    }
}

/// Picks the configuration file to read, if any.
pub fn locate(
    flag: Option<&Path>,
    env_value: Option<OsString>,
    working_dir: &Path,
) -> Option<ConfigSource> {
    if let Some(path) = flag {
        return Some(ConfigSource::Explicit(path.to_path_buf()));
    }
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(ConfigSource::Explicit(PathBuf::from(value)));
    }
    let candidate = working_dir.join(DEFAULT_CONFIG_FILENAME);
    candidate.is_file().then_some(ConfigSource::WorkingDir(candidate))
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration for this process: `flag`, then
    /// `CARKEEP_CONFIG`, then `./carkeep.toml`, else defaults.
    pub fn load(flag: Option<&Path>) -> Result<Self, ConfigError> {
        match locate(flag, std::env::var_os(CONFIG_ENV), Path::new(".")) {
            Some(source) => Self::load_file(source.path()),
            None => Ok(Self::default()),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.backend, &self.database.connection_string)
    }
}
