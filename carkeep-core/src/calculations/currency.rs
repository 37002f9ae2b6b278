//! Formatting of amounts for display tables, and the reverse parse.
//!
//! Display amounts are whole dollars with comma grouping: `$12,345`,
//! `-$2,500`. [`parse_currency`] accepts anything these functions emit,
//! plus plain numbers, so a table cell can always be turned back into a
//! [`Decimal`].

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::calculations::common::round_dollars;

/// Error returned when a string is not a recognizable currency amount.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid currency amount '{0}'")]
pub struct CurrencyParseError(pub String);

static CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<lead>[+-])?\$?(?P<inner>[+-])?(?P<int>\d{1,3}(?:,\d{3})+|\d+)(?P<frac>\.\d+)?$")
        .expect("currency pattern is valid")
});

/// Formats `value` as whole dollars: `$12,345`, `-$2,500`, `$0`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::currency::format_currency;
///
/// assert_eq!(format_currency(dec!(12345.4)), "$12,345");
/// assert_eq!(format_currency(dec!(-2500)), "-$2,500");
/// assert_eq!(format_currency(dec!(-0.4)), "$0");
/// ```
pub fn format_currency(value: Decimal) -> String {
    let rounded = round_dollars(value);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}", group_thousands(rounded.abs()))
}

/// Like [`format_currency`], with an explicit `+` on positive amounts.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::currency::format_signed_currency;
///
/// assert_eq!(format_signed_currency(dec!(1234)), "+$1,234");
/// assert_eq!(format_signed_currency(dec!(-2500)), "-$2,500");
/// assert_eq!(format_signed_currency(dec!(0)), "$0");
/// ```
pub fn format_signed_currency(value: Decimal) -> String {
    let formatted = format_currency(value);
    if round_dollars(value) > Decimal::ZERO {
        format!("+{formatted}")
    } else {
        formatted
    }
}

/// Formats a fraction as a percentage with two decimals: `0.045` → `4.50%`.
pub fn format_percentage(fraction: Decimal) -> String {
    let percent =
        (fraction * Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{percent:.2}%")
}

/// Parses a currency string back into a [`Decimal`].
///
/// Accepts an optional sign before or after `$`, an optional `$`,
/// comma-grouped or plain digits and an optional fraction.
///
/// ```
/// use rust_decimal_macros::dec;
/// use carkeep_core::calculations::currency::parse_currency;
///
/// assert_eq!(parse_currency("$12,345"), Ok(dec!(12345)));
/// assert_eq!(parse_currency("-$2,500"), Ok(dec!(-2500)));
/// assert_eq!(parse_currency("+$1,234"), Ok(dec!(1234)));
/// assert!(parse_currency("twelve").is_err());
/// ```
pub fn parse_currency(input: &str) -> Result<Decimal, CurrencyParseError> {
    let invalid = || CurrencyParseError(input.to_string());
    let trimmed = input.trim();
    let caps = CURRENCY.captures(trimmed).ok_or_else(invalid)?;

    let sign = match (caps.name("lead"), caps.name("inner")) {
        (Some(_), Some(_)) => return Err(invalid()),
        (Some(s), None) | (None, Some(s)) => s.as_str(),
        (None, None) => "",
    };
    let digits = caps["int"].replace(',', "");
    let fraction = caps.name("frac").map_or("", |m| m.as_str());

    let magnitude: Decimal = format!("{digits}{fraction}").parse().map_err(|_| invalid())?;
    Ok(if sign == "-" { -magnitude } else { magnitude })
}

fn group_thousands(whole: Decimal) -> String {
    let text = whole.trunc().to_string();
    let digits = text.split('.').next().unwrap_or_default();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
