use std::fmt;

use thiserror::Error;

use crate::db::RepositoryError;

/// The kind of record a lookup or mutation was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    StateTax,
    Scenario,
    Baseline,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StateTax => "state tax configuration",
            Self::Scenario => "scenario",
            Self::Baseline => "baseline",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the registry, calculators and service layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CarKeepError {
    /// An input failed validation. `field` is a dotted path such as
    /// `scenario.vehicle.values_3yr`.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{kind} '{key}' not found")]
    NotFound { kind: RecordKind, key: String },

    #[error("state tax configuration '{0}' is protected and cannot be deleted")]
    ProtectedRecord(String),

    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: RecordKind, key: String },

    /// Arithmetic overflowed or an internal invariant did not hold.
    #[error("computation failed: {0}")]
    Computation(String),

    #[error("storage error: {0}")]
    Storage(RepositoryError),
}

impl CarKeepError {
    pub fn validation(
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(
        kind: RecordKind,
        key: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Maps a storage error onto a record-level error, attaching the record
    /// identity to `NotFound` and `AlreadyExists`.
    pub fn from_repository(
        err: RepositoryError,
        kind: RecordKind,
        key: &str,
    ) -> Self {
        match err {
            RepositoryError::NotFound => Self::not_found(kind, key),
            RepositoryError::AlreadyExists => Self::AlreadyExists {
                kind,
                key: key.to_string(),
            },
            other => Self::Storage(other),
        }
    }

    /// HTTP-equivalent status for callers that expose the core over a
    /// request/response surface.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::ProtectedRecord(_) | Self::AlreadyExists { .. } => 409,
            Self::Computation(_) | Self::Storage(_) => 500,
        }
    }
}

impl From<RepositoryError> for CarKeepError {
    fn from(err: RepositoryError) -> Self {
        Self::Storage(err)
    }
}
