//! Currency-prefixed amounts as they appear in the sheet.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Default currency code for rows that leave the column blank.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Prefix written before an amount in the given currency.
pub fn currency_prefix(code: &str) -> String {
    match code {
        "USD" => "$".to_string(),
        "GBP" => "£".to_string(),
        "EUR" => "€".to_string(),
        "JPY" => "¥".to_string(),
        other => format!("{} ", other),
    }
}

/// Format an amount with its currency prefix and two decimals: `$12.50`.
pub fn format_money(code: &str, amount: Decimal) -> String {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    let prefix = currency_prefix(code);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}{}", prefix, rounded.abs())
    } else {
        format!("{}{}", prefix, rounded.abs())
    }
}

/// Parse a money cell by keeping only digits, dots and minus signs.
///
/// Returns `None` for cells that carry no number at all.
pub fn parse_money(cell: &str) -> Option<Decimal> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Normalize a currency cell: trimmed upper-case code, `USD` when blank.
pub fn normalize_currency(cell: &str) -> String {
    let code = cell.trim().to_ascii_uppercase();
    if code.is_empty() {
        DEFAULT_CURRENCY.to_string()
    } else {
        code
    }
}
