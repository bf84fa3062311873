/// Serde and parsing helpers for HTML form input.
///
/// HTML `<select>` elements with an empty `<option value="">` send an empty
/// string for the field, which `serde_urlencoded` cannot parse as an integer.
/// These helpers treat empty strings as `None` for `Option<i64>` fields.
use serde::{Deserialize, Deserializer};

pub fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse::<i64>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Treat empty or whitespace-only input as absent.
pub fn non_empty(s: &Option<String>) -> Option<String> {
    s.as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Largest amount a form may carry: one trillion in whole units.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000_000;

/// Parse a decimal amount such as `"1234.5"` or `"1,234.50"` into cents.
///
/// Only plain decimal notation is accepted. Exponents, `inf`/`NaN` and
/// amounts beyond [`MAX_AMOUNT_CENTS`] are rejected.
pub fn parse_cents(s: &str) -> Option<i64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    let digits = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    cleaned
        .parse::<f64>()
        .ok()
        .map(|v| (v * 100.0).round())
        .filter(|cents| cents.abs() <= MAX_AMOUNT_CENTS as f64)
        .map(|cents| cents as i64)
}

/// Render cents back into a form input value, e.g. `123456` -> `"1234.56"`.
pub fn cents_to_input(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
