//! Money formatting for pages and exports.
//!
//! Amounts are integer cents. Formatting is: sign + currency symbol + number
//! with locale thousands separator.

/// Signed amount: `+` for positive, `-` for negative, no sign for zero.
pub fn format_money_plain(cents: i64, currency: &str, locale: &str) -> String {
    let body = format_unsigned(cents.unsigned_abs(), currency, locale);
    match cents.signum() {
        1 => format!("+{}", body),
        -1 => format!("-{}", body),
        _ => body,
    }
}

/// Amount without a sign prefix, for prices and totals that are never negative.
pub fn format_money_neutral(cents: i64, currency: &str, locale: &str) -> String {
    format_unsigned(cents.unsigned_abs(), currency, locale)
}

/// Rounded to whole currency units; only negative amounts carry a sign.
/// Example: 123_449 -> "$1,234", -50_000 -> "-$500".
pub fn format_money_whole(cents: i64, currency: &str, locale: &str) -> String {
    let (thousands_sep, _) = locale_separators(locale);
    let whole = (cents.unsigned_abs() + 50) / 100;
    let formatted = format!(
        "{}{}",
        currency_symbol(currency),
        format_with_thousands(whole, thousands_sep)
    );
    if cents < 0 && whole > 0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// CSS class for a signed amount.
pub fn money_class(cents: i64) -> &'static str {
    match cents.signum() {
        1 => "amount-positive",
        -1 => "amount-negative",
        _ => "amount-zero",
    }
}

/// Format a percentage value with locale-aware decimal separator.
/// Shows sign (+/-) and two decimal places.
/// Example: 12.346 -> "+12.35%" (en-US) or "+12,35%" (de-DE)
pub fn format_percent(value: f64, locale: &str) -> String {
    let (_, decimal_sep) = locale_separators(locale);
    let hundredths = (value.abs() * 100.0).round() as u64;
    let sign = if hundredths == 0 {
        ""
    } else if value > 0.0 {
        "+"
    } else {
        "-"
    };

    format!(
        "{}{}{}{:02}%",
        sign,
        hundredths / 100,
        decimal_sep,
        hundredths % 100
    )
}

fn format_unsigned(abs_cents: u64, currency: &str, locale: &str) -> String {
    let (thousands_sep, decimal_sep) = locale_separators(locale);
    format!(
        "{}{}{}{:02}",
        currency_symbol(currency),
        format_with_thousands(abs_cents / 100, thousands_sep),
        decimal_sep,
        abs_cents % 100
    )
}

/// Get thousands and decimal separators based on locale.
fn locale_separators(locale: &str) -> (char, char) {
    match locale {
        "de-DE" | "de-AT" | "de-CH" | "fr-FR" | "fr-BE" | "fr-CA" | "es-ES" | "es-AR" | "it-IT"
        | "pt-BR" | "pt-PT" | "nl-NL" | "nl-BE" | "pl-PL" | "da-DK" | "nb-NO" | "sv-SE"
        | "fi-FI" => ('.', ','),
        _ => (',', '.'),
    }
}

fn format_with_thousands(n: u64, sep: char) -> String {
    let digits = n.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(sep);
        }
        result.push(c);
    }
    result
}

fn currency_symbol(currency: &str) -> &'static str {
    match currency.to_uppercase().as_str() {
        "USD" => "$",
        "EUR" => "\u{20ac}",
        "GBP" => "\u{00a3}",
        "JPY" => "\u{00a5}",
        "CAD" => "C$",
        "AUD" => "A$",
        "NZD" => "NZ$",
        "CHF" => "CHF\u{00a0}",
        "SEK" | "NOK" | "DKK" => "kr\u{00a0}",
        "INR" => "\u{20b9}",
        "ZAR" => "R\u{00a0}",
        _ => "$",
    }
}
