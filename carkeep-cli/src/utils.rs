use carkeep_core::Table;
use rust_decimal::Decimal;
use thiserror::Error;

/// Error returned when a command-line amount cannot be parsed.
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct ParseDecimalError {
    input: String,
    #[source]
    source: rust_decimal::Error,
}

/// Normalizes input for decimal parsing: trims whitespace, a leading `$` and
/// comma thousands separators.
fn normalize_decimal_input(s: &str) -> String {
    let trimmed = s.trim();
    trimmed.strip_prefix('$').unwrap_or(trimmed).replace(',', "")
}

/// Parses an amount such as `21,000`, `$9,909.95` or `564.10`.
pub fn parse_decimal(s: &str) -> Result<Decimal, ParseDecimalError> {
    let normalized = normalize_decimal_input(s);
    normalized.parse().map_err(|e| {
        tracing::debug!(input = %s, "invalid decimal: {}", e);
        ParseDecimalError {
            input: s.to_string(),
            source: e,
        }
    })
}

/// Parses a percentage (`4.57` or `4.57%`) into a fraction (`0.0457`).
pub fn parse_percentage(s: &str) -> Result<Decimal, ParseDecimalError> {
    let trimmed = s.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed);
    Ok(parse_decimal(number)? / Decimal::ONE_HUNDRED)
}

/// `clap` value parser for amounts.
pub fn amount_arg(s: &str) -> Result<Decimal, String> {
    parse_decimal(s).map_err(|e| e.to_string())
}

/// `clap` value parser for percentages.
pub fn percentage_arg(s: &str) -> Result<Decimal, String> {
    parse_percentage(s).map_err(|e| e.to_string())
}

/// Renders `table` as aligned plain text: the label column left-aligned,
/// every other column right-aligned, with a rule under the header.
pub fn render_table(table: &Table) -> String {
    let width = table
        .data
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.columns.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; width];
    for row in std::iter::once(&table.columns).chain(&table.data) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if i == 0 {
                    format!("{cell:<w$}")
                } else {
                    format!("{cell:>w$}")
                }
            })
            .collect();
        cells.join("  ").trim_end().to_string()
    };

    let mut out = line(&table.columns);
    out.push('\n');
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');
    for row in &table.data {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}
