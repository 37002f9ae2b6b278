//! Import and export of CarKeep data: state tax CSV files, legacy scenario
//! documents and CSV copies of comparison tables.

pub mod export;
pub mod loader;
pub mod scenario_file;

pub use export::{ExportError, export_comparison_csv, export_matrix_csv, write_table_csv};
pub use loader::{StateTaxLoader, StateTaxLoaderError, StateTaxRecord};
pub use scenario_file::{ScenarioFile, ScenarioFileError, ScenarioFileLoader, ScenarioLoadSummary};
