use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::currency::{CurrencyParseError, parse_currency};

/// Row label of the summary table's pre-equity total.
pub const SUBTOTAL: &str = "SUBTOTAL";
/// Row label of the cost-difference table's total.
pub const TOTAL_COST_DIFFERENCE: &str = "TOTAL COST DIFFERENCE";
/// Row label of the summary table's final total.
pub const NET_OUT_OF_POCKET: &str = "NET OUT-OF-POCKET";
/// Row label of the monthly-payment table's total.
pub const TOTAL_MONTHLY: &str = "TOTAL MONTHLY";

/// A display table: column headers plus rows of pre-formatted cells. Column 0
/// of every row is the row label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub data: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            data: Vec::new(),
        }
    }

    pub fn push_row<I, S>(
        &mut self,
        cells: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data.push(cells.into_iter().map(Into::into).collect());
    }

    /// The first row whose label equals `label`.
    pub fn row(
        &self,
        label: &str,
    ) -> Option<&[String]> {
        self.data
            .iter()
            .find(|row| row.first().is_some_and(|cell| cell == label))
            .map(Vec::as_slice)
    }

    /// Parses the currency cell at `column` of the row labelled `label`.
    pub fn amount(
        &self,
        label: &str,
        column: usize,
    ) -> Result<Option<Decimal>, CurrencyParseError> {
        self.row(label)
            .and_then(|row| row.get(column))
            .map(|cell| parse_currency(cell))
            .transpose()
    }

    /// Row labels in order.
    pub fn labels(&self) -> Vec<&str> {
        self.data
            .iter()
            .filter_map(|row| row.first().map(String::as_str))
            .collect()
    }
}

/// The three tables produced for one scenario-versus-baseline comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub summary: Table,
    pub cost_difference: Table,
    pub monthly_payment: Table,
}
