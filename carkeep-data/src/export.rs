use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use carkeep_core::Table;
use carkeep_core::calculations::{ComparisonMatrix, ScenarioComparison};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(String),
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

/// Writes `table` as CSV: the header row, then every data row.
pub fn write_table_csv<W: Write>(
    table: &Table,
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.data {
        csv_writer.write_record(row)?;
    }
    csv_writer
        .flush()
        .map_err(|e| ExportError::Csv(e.to_string()))?;
    Ok(())
}

/// Writes the three tables of one comparison to
/// `{dir}/{key}_{table}_comparison.csv`, creating `dir` if needed.
pub fn export_comparison_csv(
    comparison: &ScenarioComparison,
    dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let results = &comparison.results;
    let tables = [
        ("summary", &results.summary),
        ("cost_difference", &results.cost_difference),
        ("monthly_payment", &results.monthly_payment),
    ];
    write_all(dir, tables.map(|(name, table)| (format!("{}_{name}_comparison.csv", comparison.key), table)))
}

/// Writes the three matrix tables to `{dir}/{table}_matrix.csv`.
pub fn export_matrix_csv(
    matrix: &ComparisonMatrix,
    dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    let tables = [
        ("summary", &matrix.summary),
        ("cost_difference", &matrix.cost_difference),
        ("monthly_payment", &matrix.monthly_payment),
    ];
    write_all(dir, tables.map(|(name, table)| (format!("{name}_matrix.csv"), table)))
}

fn write_all<'t>(
    dir: &Path,
    tables: impl IntoIterator<Item = (String, &'t Table)>,
) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    for (file_name, table) in tables {
        let path = dir.join(file_name);
        let file = File::create(&path).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        write_table_csv(table, file)?;
        debug!(path = %path.display(), "table exported");
        written.push(path);
    }
    Ok(written)
}
