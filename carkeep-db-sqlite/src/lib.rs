//! SQLite backend for the CarKeep repository.

mod decimal;
pub mod factory;
pub mod repository;

pub use factory::{SqliteRepositoryFactory, seeds_dir, sqlite_url};
pub use repository::SqliteRepository;
