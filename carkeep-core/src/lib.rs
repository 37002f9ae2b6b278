pub mod calculations;
pub mod db;
pub mod error;
pub mod models;
pub mod registry;
pub mod service;

pub use db::repository::{CarKeepRepository, RepositoryError};
pub use error::{CarKeepError, RecordKind};
pub use models::*;
pub use registry::StateTaxRegistry;
pub use service::CarKeepService;
